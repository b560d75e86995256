//! Resource-open bridge for handing local files to external viewers.
//!
//! The bridge turns an [`OpenRequest`] into either a launched viewer or a
//! structured [`OpenFailure`]. Each request runs the same sequence:
//!
//! 1. validate the path (present, non-empty, absolute);
//! 2. resolve it into a [`ResourceHandle`] through a [`ResourceResolver`],
//!    which carries a read-only, non-persistable [`AccessGrant`];
//! 3. derive a [`ContentType`] hint;
//! 4. ask the [`ViewerHost`] for a viewer registered for that type and launch
//!    it;
//! 5. otherwise relax the type to `*/*` and present the host's generic
//!    chooser.
//!
//! Platform failures never escape as panics or raw errors: every path through
//! [`OpenBridge::open`] ends in an [`OpenOutcome`].
//!
//! The [`dispatch`] module exposes the bridge to a UI layer as a method table
//! (`openFile` and friends) with a JSONL adapter for byte-stream transports.
//!
//! # Example
//!
//! ```rust,no_run
//! use handoff_bridge::{OpenBridge, OpenRequest};
//! use handoff_config::Config;
//!
//! let bridge = OpenBridge::from_config(&Config::default());
//! match bridge.open(&OpenRequest::new("/home/user/report.pdf")) {
//!     Ok(route) => tracing::info!(?route, "viewer launched"),
//!     Err(failure) => tracing::warn!(%failure, "open failed"),
//! }
//! ```

mod bridge;
mod content_type;
pub mod dispatch;
pub mod host;
mod outcome;
mod request;
mod resource;

#[cfg(test)]
mod tests;

pub use self::bridge::{BRIDGE_TARGET, OpenBridge};
pub use self::content_type::{ContentType, ContentTypeResolver};
pub use self::host::{ChooserOutcome, HostError, Viewer, ViewerHost};
pub use self::outcome::{FailureKind, OpenFailure, OpenOutcome, OpenRoute};
pub use self::request::OpenRequest;
pub use self::resource::{
    AccessGrant, AccessMode, ResolveError, ResourceHandle, ResourceResolver, ScopedResolver,
};
