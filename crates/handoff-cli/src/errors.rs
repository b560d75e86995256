//! Error types for the CLI runtime.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use handoff_bootstrap::protocol::ProtocolError;
use handoff_bridge::dispatch::DispatchError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Exit status for a request that was processed but failed.
pub(crate) const REQUEST_FAILURE: u8 = 1;

/// Exit status for usage, configuration and telemetry problems.
pub(crate) const SETUP_FAILURE: u8 = 2;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("no module artifact configured; pass --artifact or set module_artifact")]
    MissingArtifact,
    #[error("failed to start async runtime: {0}")]
    Runtime(io::Error),
    #[error("bridge request failed: {0}")]
    Bridge(#[from] DispatchError),
    #[error("module host session failed: {0}")]
    ModuleHost(#[from] ProtocolError),
}

impl AppError {
    /// Maps the error onto the process exit status.
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::LoadConfiguration(_)
            | Self::CliUsage(_)
            | Self::Telemetry(_)
            | Self::MissingArtifact => ExitCode::from(SETUP_FAILURE),
            Self::Runtime(_)
            | Self::Bridge(_)
            | Self::ModuleHost(_) => ExitCode::from(REQUEST_FAILURE),
        }
    }
}
