//! Method dispatch for UI-layer callers.
//!
//! A UI layer talks to the bridge by method name. [`MethodTable`] maps each
//! name to a handler returning a tagged [`BridgeResponse`], and [`serve`]
//! adapts the table to a JSONL byte stream.
//!
//! ## Protocol
//!
//! One request per line:
//!
//! ```json
//! {"method":"openFile","path":"/home/user/report.pdf"}
//! ```
//!
//! One response per line:
//!
//! ```json
//! {"kind":"success"}
//! {"kind":"error","code":"INVALID_ARGUMENT","message":"Path is required"}
//! {"kind":"error","code":"FILE_OPEN_ERROR","message":"Unable to open file","detail":"no capable viewer: ..."}
//! {"kind":"not_implemented","method":"shareFile"}
//! ```

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub use self::handler::{MAX_REQUEST_BYTES, SessionSummary, handle_line, serve};
pub use self::request::BridgeRequest;
pub use self::response::{BridgeResponse, ErrorCode, FILE_OPEN_MESSAGE, ResponseWriter};
pub use self::router::{DISPATCH_TARGET, MethodHandler, MethodTable, OPEN_FILE_METHOD};
