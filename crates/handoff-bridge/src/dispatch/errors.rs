//! Errors raised while reading and decoding bridge requests.

use std::io;

use thiserror::Error;

/// Errors surfaced by the JSONL adapter.
///
/// Decoding failures are answered with a `MALFORMED_REQUEST` response and the
/// loop continues; only transport failures end a session.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The line was not a JSON object of the expected shape.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Parser diagnostic.
        message: String,
        /// Underlying JSON error, when there is one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The request named no method.
    #[error("invalid request structure: {message}")]
    InvalidStructure {
        /// Description of the missing field.
        message: String,
    },

    /// The request line exceeded the size limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// Reading or writing the transport failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A response could not be serialized.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    /// Returns `true` when the session can continue after answering the
    /// offending line.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest { .. }
                | Self::InvalidStructure { .. }
                | Self::RequestTooLarge { .. }
        )
    }

    /// Creates a malformed request error from a JSON error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid structure error.
    #[must_use]
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Creates a request too large error.
    #[must_use]
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}
