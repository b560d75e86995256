//! The module host actor.
//!
//! ```text
//!  BootstrapHandle ──EnsureReady──► ┌────────────┐
//!  BootstrapHandle ──State────────► │ ModuleHost │──spawn once──► initializer task
//!                                   │   (actor)  │◄──join─────────┘
//!       oneshot replies ◄────────── └────────────┘
//! ```
//!
//! One task owns the [`BootstrapState`] and drains a bounded mailbox one
//! message at a time, so the transition out of `Uninitialized` has a single
//! writer. Callers that arrive while the attempt is running are parked as
//! oneshot senders and all receive the same [`BootstrapResult`] when it
//! finishes. The initializer runs on its own task: dropping a caller's future
//! never cancels it.

use std::future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::HOST_TARGET;
use crate::health::{BootstrapReporter, StructuredBootstrapReporter};
use crate::initializer::{ModuleInitError, ModuleInitializer};
use crate::state::{BootstrapResult, BootstrapState};

/// Default capacity of the host mailbox.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

type InitOutcome = Result<(), ModuleInitError>;

/// Errors returned by [`BootstrapHandle`] when the host is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// The host task has stopped and can no longer answer.
    #[error("module host has stopped")]
    HostStopped,
}

enum Command {
    EnsureReady(oneshot::Sender<BootstrapResult>),
    State(oneshot::Sender<BootstrapState>),
}

/// Builder for the module host actor.
pub struct ModuleHost<I> {
    initializer: I,
    reporter: Arc<dyn BootstrapReporter>,
    capacity: usize,
}

impl<I: ModuleInitializer> ModuleHost<I> {
    /// Creates a host around `initializer` with the structured reporter.
    #[must_use]
    pub fn new(initializer: I) -> Self {
        Self {
            initializer,
            reporter: Arc::new(StructuredBootstrapReporter::new()),
            capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn BootstrapReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets the mailbox capacity. Zero is raised to one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Starts the actor on the current Tokio runtime.
    ///
    /// The actor stops once every handle has been dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> BootstrapHandle {
        let (sender, mailbox) = mpsc::channel(self.capacity);
        let actor = Actor {
            mailbox,
            initializer: Arc::new(self.initializer),
            reporter: self.reporter,
            state: BootstrapState::Uninitialized,
            listeners: Vec::new(),
            in_flight: None,
        };
        tokio::spawn(actor.run());
        BootstrapHandle { sender }
    }
}

/// Cloneable handle used to talk to a running [`ModuleHost`].
#[derive(Debug, Clone)]
pub struct BootstrapHandle {
    sender: mpsc::Sender<Command>,
}

impl BootstrapHandle {
    /// Waits until the module is ready or has failed.
    ///
    /// The first call starts initialization; concurrent and later calls share
    /// its result.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::HostStopped`] if the host task is gone.
    pub async fn ensure_ready(&self) -> Result<BootstrapResult, BootstrapError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::EnsureReady(reply)).await?;
        response.await.map_err(|_| BootstrapError::HostStopped)
    }

    /// Returns a snapshot of the lifecycle state without triggering
    /// initialization.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::HostStopped`] if the host task is gone.
    pub async fn state(&self) -> Result<BootstrapState, BootstrapError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::State(reply)).await?;
        response.await.map_err(|_| BootstrapError::HostStopped)
    }

    async fn send(&self, command: Command) -> Result<(), BootstrapError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| BootstrapError::HostStopped)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::EnsureReady(_) => "EnsureReady",
            Self::State(_) => "State",
        })
    }
}

struct Actor<I> {
    mailbox: mpsc::Receiver<Command>,
    initializer: Arc<I>,
    reporter: Arc<dyn BootstrapReporter>,
    state: BootstrapState,
    listeners: Vec<oneshot::Sender<BootstrapResult>>,
    in_flight: Option<JoinHandle<InitOutcome>>,
}

impl<I: ModuleInitializer> Actor<I> {
    async fn run(mut self) {
        debug!(target: HOST_TARGET, "module host started");
        loop {
            tokio::select! {
                command = self.mailbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                joined = join_in_flight(&mut self.in_flight) => self.complete(joined),
            }
        }
        debug!(
            target: HOST_TARGET,
            state = %self.state,
            "module host stopped: all handles dropped"
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::State(reply) => {
                // A caller that stopped waiting is not an error.
                let _ignored = reply.send(self.state.clone());
            }
            Command::EnsureReady(reply) => self.ensure_ready(reply),
        }
    }

    fn ensure_ready(&mut self, reply: oneshot::Sender<BootstrapResult>) {
        if let Some(result) = self.state.terminal_result() {
            let _ignored = reply.send(result);
            return;
        }

        self.listeners.push(reply);
        if self.state == BootstrapState::Uninitialized {
            self.start();
        } else {
            self.reporter.listener_attached(self.listeners.len());
        }
    }

    fn start(&mut self) {
        self.state = BootstrapState::Initializing;
        self.reporter.initialization_started();
        let initializer = Arc::clone(&self.initializer);
        self.in_flight = Some(tokio::spawn(async move { initializer.initialize().await }));
    }

    fn complete(&mut self, joined: Result<InitOutcome, JoinError>) {
        self.in_flight = None;
        let outcome = joined.unwrap_or_else(|error| {
            warn!(target: HOST_TARGET, %error, "initialization task did not finish");
            Err(ModuleInitError::aborted(error.to_string()))
        });

        let listeners = std::mem::take(&mut self.listeners);
        match &outcome {
            Ok(()) => {
                self.state = BootstrapState::Ready;
                self.reporter.initialization_succeeded(listeners.len());
            }
            Err(error) => {
                self.state = BootstrapState::Failed(error.to_string());
                self.reporter
                    .initialization_failed(error, listeners.len());
            }
        }

        let Some(result) = self.state.terminal_result() else {
            return;
        };
        for listener in listeners {
            let _ignored = listener.send(result.clone());
        }
    }
}

async fn join_in_flight(
    in_flight: &mut Option<JoinHandle<InitOutcome>>,
) -> Result<InitOutcome, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => future::pending().await,
    }
}
