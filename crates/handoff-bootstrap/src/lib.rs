//! Lazy, exactly-once bootstrap of a shared module.
//!
//! Any number of callers may ask for the module concurrently through cloned
//! [`BootstrapHandle`]s. The first request starts the single
//! [`ModuleInitializer`] run; everyone else, including callers arriving after
//! it finished, receives the same [`BootstrapResult`]. Failure is permanent
//! for the host instance.
//!
//! ```rust,no_run
//! use handoff_bootstrap::{ArtifactInitializer, ModuleHost};
//!
//! # async fn demo() -> Result<(), handoff_bootstrap::BootstrapError> {
//! let initializer = ArtifactInitializer::new("/usr/share/handoff/module.wasm");
//! let slot = initializer.slot();
//! let handle = ModuleHost::new(initializer).spawn();
//!
//! if handle.ensure_ready().await?.success {
//!     let module = slot.get();
//!     tracing::info!(loaded = module.is_some(), "module available");
//! }
//! # Ok(())
//! # }
//! ```

mod health;
mod host;
mod initializer;
pub mod protocol;
mod state;

pub use self::health::{BootstrapReporter, StructuredBootstrapReporter};
pub use self::host::{BootstrapError, BootstrapHandle, DEFAULT_MAILBOX_CAPACITY, ModuleHost};
pub use self::initializer::{
    ArtifactInitializer, InitFuture, LoadedModule, ModuleInitError, ModuleInitializer, ModuleSlot,
};
pub use self::state::{BootstrapResult, BootstrapState};

/// Tracing target for the host actor.
pub(crate) const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Tracing target for module initializers.
pub(crate) const INITIALIZER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::initializer");

/// Tracing target for the JSONL adapter.
pub(crate) const PROTOCOL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::protocol");
