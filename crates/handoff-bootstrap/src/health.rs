//! Structured reporting for bootstrap lifecycle events.

use std::sync::Arc;

use crate::initializer::ModuleInitError;

/// Tracing target for lifecycle events.
const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer notified as the module host moves through its lifecycle.
pub trait BootstrapReporter: Send + Sync {
    /// Invoked when the first caller triggers initialization.
    fn initialization_started(&self);

    /// Invoked when initialization succeeds.
    fn initialization_succeeded(&self, listeners: usize);

    /// Invoked when initialization fails.
    fn initialization_failed(&self, error: &ModuleInitError, listeners: usize);

    /// Invoked when a caller attaches to the in-flight attempt.
    fn listener_attached(&self, pending: usize);
}

impl<T> BootstrapReporter for Arc<T>
where
    T: BootstrapReporter + ?Sized,
{
    fn initialization_started(&self) {
        (**self).initialization_started();
    }

    fn initialization_succeeded(&self, listeners: usize) {
        (**self).initialization_succeeded(listeners);
    }

    fn initialization_failed(&self, error: &ModuleInitError, listeners: usize) {
        (**self).initialization_failed(error, listeners);
    }

    fn listener_attached(&self, pending: usize) {
        (**self).listener_attached(pending);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredBootstrapReporter;

impl StructuredBootstrapReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BootstrapReporter for StructuredBootstrapReporter {
    fn initialization_started(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "initialization_started",
            "starting module initialization"
        );
    }

    fn initialization_succeeded(&self, listeners: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "initialization_succeeded",
            listeners,
            "module ready"
        );
    }

    fn initialization_failed(&self, error: &ModuleInitError, listeners: usize) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "initialization_failed",
            error = %error,
            listeners,
            "module initialization failed"
        );
    }

    fn listener_attached(&self, pending: usize) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "listener_attached",
            pending,
            "caller waiting for module initialization"
        );
    }
}
