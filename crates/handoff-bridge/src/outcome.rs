//! Outcome of a single open request.

use std::fmt;

use thiserror::Error;

/// Which attempt launched the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenRoute {
    /// A viewer registered for the derived content type was launched.
    Primary,
    /// The generic chooser was presented after the primary attempt found no
    /// viewer.
    Fallback,
}

impl fmt::Display for OpenRoute {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        })
    }
}

/// Classification of a failed open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request was malformed; no platform action was attempted.
    InvalidArgument,
    /// The path could not be turned into a grantable resource.
    ResourceResolutionError,
    /// Neither the typed nor the generic attempt found a viewer.
    NoCapableViewer,
    /// The host failed unexpectedly during a launch attempt.
    PlatformError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::InvalidArgument => "invalid argument",
            Self::ResourceResolutionError => "resource resolution error",
            Self::NoCapableViewer => "no capable viewer",
            Self::PlatformError => "platform error",
        })
    }
}

/// Terminal failure for one open request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct OpenFailure {
    kind: FailureKind,
    message: String,
}

impl OpenFailure {
    /// Builds a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an [`FailureKind::InvalidArgument`] failure.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidArgument, message)
    }

    /// Builds a [`FailureKind::ResourceResolutionError`] failure.
    #[must_use]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ResourceResolutionError, message)
    }

    /// Builds a [`FailureKind::NoCapableViewer`] failure.
    #[must_use]
    pub fn no_capable_viewer(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NoCapableViewer, message)
    }

    /// Builds a [`FailureKind::PlatformError`] failure.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::new(FailureKind::PlatformError, message)
    }

    /// Failure classification.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Diagnostic text describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Result of [`OpenBridge::open`](crate::OpenBridge::open): exactly one per
/// request.
pub type OpenOutcome = Result<OpenRoute, OpenFailure>;
