//! Open-file requests as issued by the UI layer.

use camino::Utf8Path;

use crate::outcome::OpenFailure;

/// A single request to open a local file.
///
/// The path is optional because the calling layer may omit it entirely; the
/// bridge reports that as an invalid argument rather than refusing to build
/// the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    path: Option<String>,
}

impl OpenRequest {
    /// Creates a request for the given path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Creates a request whose path was not supplied.
    #[must_use]
    pub const fn without_path() -> Self {
        Self { path: None }
    }

    /// Creates a request from an optional path.
    #[must_use]
    pub const fn from_optional(path: Option<String>) -> Self {
        Self { path }
    }

    /// Returns the raw path, if one was supplied.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Checks the preconditions and returns the validated path.
    ///
    /// # Errors
    ///
    /// Returns an [`OpenFailure`] of kind
    /// [`FailureKind::InvalidArgument`](crate::FailureKind::InvalidArgument)
    /// when the path is missing, blank, or relative.
    pub fn validated_path(&self) -> Result<&Utf8Path, OpenFailure> {
        let raw = match self.path.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Err(OpenFailure::invalid_argument("Path is required")),
        };

        let path = Utf8Path::new(raw);
        if path.is_relative() {
            return Err(OpenFailure::invalid_argument(format!(
                "path must be absolute: {raw}"
            )));
        }
        Ok(path)
    }
}
