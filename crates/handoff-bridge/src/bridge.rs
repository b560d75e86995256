//! The open algorithm: resolve, try the typed viewer, fall back to a chooser.

use handoff_config::{Config, DEFAULT_CHOOSER_TITLE};
use tracing::{debug, info, warn};

use crate::content_type::{ContentType, ContentTypeResolver};
use crate::host::{ChooserOutcome, DesktopHost, ViewerHost};
use crate::outcome::{OpenFailure, OpenOutcome, OpenRoute};
use crate::request::OpenRequest;
use crate::resource::{ResourceHandle, ResourceResolver, ScopedResolver};

/// Tracing target for bridge operations.
pub const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

/// Opens local files with external viewers.
///
/// Holds no per-request state; every call to [`OpenBridge::open`] is an
/// independent unit of work.
#[derive(Debug, Clone)]
pub struct OpenBridge<R, H> {
    resolver: R,
    host: H,
    content_types: ContentTypeResolver,
    chooser_title: String,
}

impl OpenBridge<ScopedResolver, DesktopHost> {
    /// Builds a bridge wired to the desktop host and the configured roots.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ScopedResolver::from_config(config),
            DesktopHost::from_config(config),
            ContentTypeResolver::from_config(config),
        )
        .with_chooser_title(config.chooser_title())
    }
}

impl<R, H> OpenBridge<R, H>
where
    R: ResourceResolver,
    H: ViewerHost,
{
    /// Builds a bridge from explicit collaborators.
    #[must_use]
    pub fn new(resolver: R, host: H, content_types: ContentTypeResolver) -> Self {
        Self {
            resolver,
            host,
            content_types,
            chooser_title: DEFAULT_CHOOSER_TITLE.to_owned(),
        }
    }

    /// Replaces the title shown on the fallback chooser.
    #[must_use]
    pub fn with_chooser_title(mut self, title: impl Into<String>) -> Self {
        self.chooser_title = title.into();
        self
    }

    /// Title shown on the fallback chooser.
    #[must_use]
    pub fn chooser_title(&self) -> &str {
        &self.chooser_title
    }

    /// Opens the file named by `request`.
    ///
    /// Always produces exactly one outcome. Invalid input is rejected before
    /// any platform call; unexpected host failures become
    /// [`FailureKind::PlatformError`](crate::FailureKind::PlatformError).
    ///
    /// # Errors
    ///
    /// Returns an [`OpenFailure`] describing why no viewer was launched.
    pub fn open(&self, request: &OpenRequest) -> OpenOutcome {
        let outcome = self.attempt(request);
        match &outcome {
            Ok(route) => info!(target: BRIDGE_TARGET, %route, "viewer launched"),
            Err(failure) => warn!(
                target: BRIDGE_TARGET,
                kind = %failure.kind(),
                detail = failure.message(),
                "open request failed"
            ),
        }
        outcome
    }

    fn attempt(&self, request: &OpenRequest) -> OpenOutcome {
        let path = request.validated_path()?;
        let resource = self
            .resolver
            .resolve(path)
            .map_err(|error| OpenFailure::resolution(error.to_string()))?;
        let content_type = self.content_types.hint_for(resource.path());
        debug!(
            target: BRIDGE_TARGET,
            path = %resource.path(),
            content_type = %content_type,
            "resolved open request"
        );

        if self.open_primary(&resource, &content_type)? {
            return Ok(OpenRoute::Primary);
        }
        self.open_fallback(&resource)
    }

    /// Returns `Ok(false)` when the host has no viewer for `content_type`.
    fn open_primary(
        &self,
        resource: &ResourceHandle,
        content_type: &ContentType,
    ) -> Result<bool, OpenFailure> {
        let viewer = match self.host.find_viewer(content_type) {
            Ok(Some(viewer)) => viewer,
            Ok(None) => {
                debug!(target: BRIDGE_TARGET, %content_type, "no registered viewer");
                return Ok(false);
            }
            Err(error) => {
                debug!(
                    target: BRIDGE_TARGET,
                    %content_type,
                    %error,
                    "viewer query failed; treating as no viewer"
                );
                return Ok(false);
            }
        };

        self.host
            .launch(&viewer, resource, content_type)
            .map_err(|error| OpenFailure::platform(error.to_string()))?;
        debug!(target: BRIDGE_TARGET, %viewer, "launched registered viewer");
        Ok(true)
    }

    fn open_fallback(&self, resource: &ResourceHandle) -> OpenOutcome {
        let wildcard = ContentType::wildcard();
        match self
            .host
            .launch_chooser(resource, &wildcard, &self.chooser_title)
        {
            Ok(ChooserOutcome::Launched) => Ok(OpenRoute::Fallback),
            Ok(ChooserOutcome::NoViewers) => Err(OpenFailure::no_capable_viewer(format!(
                "no viewer can open {}",
                resource.path()
            ))),
            Err(error) => Err(OpenFailure::platform(error.to_string())),
        }
    }
}
