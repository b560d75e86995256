//! Method-name routing.
//!
//! A [`MethodTable`] maps method names to plain function handlers. Each
//! handler receives a shared context (normally an [`OpenBridge`]) and the
//! decoded request, and always returns a [`BridgeResponse`]. Unknown methods
//! are answered with [`BridgeResponse::NotImplemented`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::request::BridgeRequest;
use super::response::BridgeResponse;
use crate::bridge::OpenBridge;
use crate::host::ViewerHost;
use crate::request::OpenRequest;
use crate::resource::ResourceResolver;

/// Tracing target for dispatch operations.
pub const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Method that opens a file.
pub const OPEN_FILE_METHOD: &str = "openFile";

/// Handler signature stored in a [`MethodTable`].
pub type MethodHandler<C> = fn(&C, &BridgeRequest) -> BridgeResponse;

/// Routes requests to handlers by method name.
pub struct MethodTable<C> {
    handlers: BTreeMap<&'static str, MethodHandler<C>>,
}

impl<C> MethodTable<C> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers `handler` for `method`, replacing any previous handler.
    #[must_use]
    pub fn with_method(mut self, method: &'static str, handler: MethodHandler<C>) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    /// Returns the registered method names in sorted order.
    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Runs the handler registered for the request's method.
    pub fn dispatch(&self, context: &C, request: &BridgeRequest) -> BridgeResponse {
        let method = request.method();
        match self.handlers.get(method) {
            Some(handler) => {
                debug!(target: DISPATCH_TARGET, method, "dispatching request");
                handler(context, request)
            }
            None => {
                debug!(target: DISPATCH_TARGET, method, "method not implemented");
                BridgeResponse::not_implemented(method)
            }
        }
    }
}

impl<C> Default for MethodTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for MethodTable<C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MethodTable")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R, H> MethodTable<OpenBridge<R, H>>
where
    R: ResourceResolver,
    H: ViewerHost,
{
    /// The standard bridge table: `openFile` only.
    #[must_use]
    pub fn for_bridge() -> Self {
        Self::new().with_method(OPEN_FILE_METHOD, open_file::<R, H>)
    }
}

fn open_file<R, H>(bridge: &OpenBridge<R, H>, request: &BridgeRequest) -> BridgeResponse
where
    R: ResourceResolver,
    H: ViewerHost,
{
    let path = request.string_argument("path").map(str::to_owned);
    BridgeResponse::from(&bridge.open(&OpenRequest::from_optional(path)))
}
