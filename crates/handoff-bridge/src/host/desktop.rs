//! Desktop host driven by command-line tools.
//!
//! [`DesktopHost`] renders the configured [`CommandTemplate`]s and runs them
//! through a [`CommandRunner`]. The defaults target freedesktop systems:
//! `xdg-mime` for the registry query, `gtk-launch` for a specific viewer and
//! `xdg-open` as the generic chooser.

use std::io;
use std::process::Command;
use std::sync::Arc;

use handoff_config::{CommandTemplate, Config, Placeholder, RenderedCommand};
use tracing::debug;

use super::{ChooserOutcome, HostError, Viewer, ViewerHost};
use crate::content_type::ContentType;
use crate::resource::ResourceHandle;

/// Tracing target for host process operations.
const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// `xdg-open` exit status meaning no tool could handle the resource.
const NO_HANDLER_STATUS: i32 = 3;

/// Captured result of a finished host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, or `None` when terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Returns `true` when the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn status_code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_owned()
    }
}

/// Runs rendered host commands to completion.
///
/// Abstracted so that [`DesktopHost`] can be tested without spawning real
/// processes.
pub trait CommandRunner {
    /// Runs `command`, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised when the program cannot be started.
    fn run(&self, command: &RenderedCommand) -> io::Result<CommandOutput>;
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &RenderedCommand) -> io::Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// [`ViewerHost`] implementation for freedesktop-style environments.
#[derive(Debug, Clone)]
pub struct DesktopHost<R = SystemRunner> {
    query: CommandTemplate,
    launch: CommandTemplate,
    chooser: CommandTemplate,
    runner: R,
}

impl DesktopHost<SystemRunner> {
    /// Builds a host from the configured command templates.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.query_command(),
            config.launch_command(),
            config.chooser_command(),
            SystemRunner,
        )
    }
}

impl<R> DesktopHost<R> {
    /// Builds a host from explicit templates and a runner.
    #[must_use]
    pub const fn new(
        query: CommandTemplate,
        launch: CommandTemplate,
        chooser: CommandTemplate,
        runner: R,
    ) -> Self {
        Self {
            query,
            launch,
            chooser,
            runner,
        }
    }
}

impl<R: CommandRunner> DesktopHost<R> {
    fn execute(&self, command: &RenderedCommand) -> Result<CommandOutput, HostError> {
        debug!(
            target: HOST_TARGET,
            program = %command.program,
            args = ?command.args,
            "running host command"
        );
        self.runner.run(command).map_err(|source| HostError::Spawn {
            program: command.program.clone(),
            source: Arc::new(source),
        })
    }

    fn require_success(command: &RenderedCommand, output: &CommandOutput) -> Result<(), HostError> {
        if output.success() {
            Ok(())
        } else {
            Err(HostError::CommandFailed {
                program: command.program.clone(),
                status: output.status_code(),
                stderr: output.stderr_text(),
            })
        }
    }
}

fn grant_ttl_secs(resource: &ResourceHandle) -> String {
    resource.grant().ttl().as_secs().to_string()
}

fn resource_substitutions<'a>(
    resource: &'a ResourceHandle,
    content_type: &'a ContentType,
    ttl_secs: &'a str,
) -> [(Placeholder, &'a str); 4] {
    [
        (Placeholder::Uri, resource.uri().as_str()),
        (Placeholder::Path, resource.path().as_str()),
        (Placeholder::ContentType, content_type.as_str()),
        (Placeholder::GrantTtlSecs, ttl_secs),
    ]
}

impl<R: CommandRunner> ViewerHost for DesktopHost<R> {
    fn find_viewer(&self, content_type: &ContentType) -> Result<Option<Viewer>, HostError> {
        let command = self
            .query
            .render(&[(Placeholder::ContentType, content_type.as_str())]);
        let output = self.execute(&command)?;
        Self::require_success(&command, &output)?;

        let stdout = String::from_utf8(output.stdout).map_err(|error| HostError::InvalidOutput {
            program: command.program.clone(),
            message: error.to_string(),
        })?;
        let viewer = stdout.lines().map(str::trim).find(|line| !line.is_empty());
        Ok(viewer.map(Viewer::new))
    }

    fn launch(
        &self,
        viewer: &Viewer,
        resource: &ResourceHandle,
        content_type: &ContentType,
    ) -> Result<(), HostError> {
        let ttl_secs = grant_ttl_secs(resource);
        let [uri, path, kind, ttl] = resource_substitutions(resource, content_type, &ttl_secs);
        let command = self
            .launch
            .render(&[uri, path, kind, ttl, (Placeholder::Viewer, viewer.id())]);
        let output = self.execute(&command)?;
        Self::require_success(&command, &output)
    }

    fn launch_chooser(
        &self,
        resource: &ResourceHandle,
        content_type: &ContentType,
        title: &str,
    ) -> Result<ChooserOutcome, HostError> {
        let ttl_secs = grant_ttl_secs(resource);
        let [uri, path, kind, ttl] = resource_substitutions(resource, content_type, &ttl_secs);
        let command = self
            .chooser
            .render(&[uri, path, kind, ttl, (Placeholder::Title, title)]);
        debug!(target: HOST_TARGET, title, "presenting viewer chooser");

        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(ChooserOutcome::NoViewers);
            }
            Err(source) => {
                return Err(HostError::Spawn {
                    program: command.program.clone(),
                    source: Arc::new(source),
                });
            }
        };

        if output.status == Some(NO_HANDLER_STATUS) {
            return Ok(ChooserOutcome::NoViewers);
        }
        Self::require_success(&command, &output)?;
        Ok(ChooserOutcome::Launched)
    }
}
