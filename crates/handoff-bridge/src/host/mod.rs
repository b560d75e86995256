//! Platform collaborators that find and launch external viewers.
//!
//! The bridge only depends on the [`ViewerHost`] trait. The production
//! implementation, [`DesktopHost`], drives the desktop's command-line tools;
//! tests substitute mocks so the fallback logic can be exercised without
//! spawning processes.

mod desktop;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use self::desktop::{CommandOutput, CommandRunner, DesktopHost, SystemRunner};

use crate::content_type::ContentType;
use crate::resource::ResourceHandle;

/// Identifier of a viewer registered with the host, for example a desktop
/// entry name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Viewer(String);

impl Viewer {
    /// Wraps a viewer identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// What happened when the generic chooser was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooserOutcome {
    /// A chooser was shown and handed the resource to a viewer.
    Launched,
    /// The host has no viewer able to handle arbitrary content.
    NoViewers,
}

/// Unexpected failures reported by the host environment.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// A host tool could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
    /// A host tool ran but reported failure.
    #[error("'{program}' exited with status {status}: {stderr}")]
    CommandFailed {
        /// Program that failed.
        program: String,
        /// Exit status, or `-1` when terminated by a signal.
        status: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// A host tool produced output that could not be interpreted.
    #[error("'{program}' produced unreadable output: {message}")]
    InvalidOutput {
        /// Program that produced the output.
        program: String,
        /// Description of the problem.
        message: String,
    },
}

/// Viewer-resolution and launch primitives supplied by the host platform.
pub trait ViewerHost {
    /// Looks up the viewer registered for `content_type`.
    ///
    /// Returns `Ok(None)` when the host answers but has no registration.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the registry query itself fails.
    fn find_viewer(&self, content_type: &ContentType) -> Result<Option<Viewer>, HostError>;

    /// Launches `viewer` with read access to `resource`.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the viewer cannot be started.
    fn launch(
        &self,
        viewer: &Viewer,
        resource: &ResourceHandle,
        content_type: &ContentType,
    ) -> Result<(), HostError>;

    /// Presents a chooser among viewers able to handle `content_type`,
    /// normally `*/*`.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the chooser fails unexpectedly.
    fn launch_chooser(
        &self,
        resource: &ResourceHandle,
        content_type: &ContentType,
        title: &str,
    ) -> Result<ChooserOutcome, HostError>;
}

impl<T> ViewerHost for Arc<T>
where
    T: ViewerHost + ?Sized,
{
    fn find_viewer(&self, content_type: &ContentType) -> Result<Option<Viewer>, HostError> {
        (**self).find_viewer(content_type)
    }

    fn launch(
        &self,
        viewer: &Viewer,
        resource: &ResourceHandle,
        content_type: &ContentType,
    ) -> Result<(), HostError> {
        (**self).launch(viewer, resource, content_type)
    }

    fn launch_chooser(
        &self,
        resource: &ResourceHandle,
        content_type: &ContentType,
        title: &str,
    ) -> Result<ChooserOutcome, HostError> {
        (**self).launch_chooser(resource, content_type, title)
    }
}
