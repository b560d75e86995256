//! Tagged responses and their JSONL writer.

use std::io::Write;

use serde::Serialize;

use super::errors::DispatchError;
use crate::outcome::{FailureKind, OpenOutcome};

/// Message attached to every platform-level open failure.
pub const FILE_OPEN_MESSAGE: &str = "Unable to open file";

/// Stable error codes carried by [`BridgeResponse::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The file could not be opened by any viewer.
    FileOpenError,
    /// A required argument was missing or invalid.
    InvalidArgument,
    /// The request line could not be decoded.
    MalformedRequest,
}

/// Result of one bridge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeResponse {
    /// The call completed; there is no payload.
    Success,
    /// The call failed.
    Error {
        /// Machine-readable classification.
        code: ErrorCode,
        /// Short human-readable summary.
        message: String,
        /// Platform diagnostic, when one exists.
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// No handler is registered for the method.
    NotImplemented {
        /// The method that was requested.
        method: String,
    },
}

impl BridgeResponse {
    /// Builds an error response.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>, detail: Option<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            detail,
        }
    }

    /// Builds the response for an undecodable request line.
    #[must_use]
    pub fn malformed(error: &DispatchError) -> Self {
        Self::error(ErrorCode::MalformedRequest, error.to_string(), None)
    }

    /// Builds the response for an unknown method.
    #[must_use]
    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::NotImplemented {
            method: method.into(),
        }
    }
}

impl From<&OpenOutcome> for BridgeResponse {
    fn from(outcome: &OpenOutcome) -> Self {
        match outcome {
            Ok(_) => Self::Success,
            Err(failure) if failure.kind() == FailureKind::InvalidArgument => {
                Self::error(ErrorCode::InvalidArgument, failure.message(), None)
            }
            Err(failure) => Self::error(
                ErrorCode::FileOpenError,
                FILE_OPEN_MESSAGE,
                Some(failure.to_string()),
            ),
        }
    }
}

/// Writes [`BridgeResponse`]s as JSONL.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_response(&mut self, response: &BridgeResponse) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
