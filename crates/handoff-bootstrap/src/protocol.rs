//! JSONL message adapter for the module host.
//!
//! Requests:
//!
//! ```json
//! {"type":"init"}
//! {"type":"status"}
//! ```
//!
//! Responses, written in completion order:
//!
//! ```json
//! {"type":"init","success":true}
//! {"type":"init","success":false,"error":"X"}
//! {"type":"status","state":"initializing"}
//! {"type":"error","message":"malformed request: ..."}
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::PROTOCOL_TARGET;
use crate::host::BootstrapHandle;
use crate::state::BootstrapResult;

/// Maximum size of a single request line in bytes.
pub const MAX_MESSAGE_BYTES: usize = 8 * 1024;

/// Messages accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BootstrapRequest {
    /// Wait for the module to be ready.
    Init,
    /// Report the lifecycle state without triggering initialization.
    Status,
}

impl BootstrapRequest {
    /// Parses one JSONL line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for anything other than a known
    /// message object.
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty message"));
        }
        serde_json::from_slice(trimmed).map_err(|error| ProtocolError::malformed(error.to_string()))
    }
}

/// Messages sent back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BootstrapResponse {
    /// Terminal result of an `init` request.
    Init(BootstrapResult),
    /// Answer to a `status` request.
    Status {
        /// Lower-case lifecycle label.
        state: &'static str,
    },
    /// The request could not be processed.
    Error {
        /// Diagnostic text.
        message: String,
    },
}

impl BootstrapResponse {
    /// Builds an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Errors raised by the adapter.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line was not a recognised message.
    #[error("malformed request: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
    },
    /// The line exceeded [`MAX_MESSAGE_BYTES`].
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
    Serialize(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Creates a malformed request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Counters describing a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines that produced a response.
    pub requests: usize,
    /// Lines answered with an error message.
    pub rejected: usize,
}

/// Answers a single request.
pub async fn answer(handle: &BootstrapHandle, request: BootstrapRequest) -> BootstrapResponse {
    match request {
        BootstrapRequest::Init => match handle.ensure_ready().await {
            Ok(result) => BootstrapResponse::Init(result),
            Err(error) => BootstrapResponse::Init(BootstrapResult::failed(error.to_string())),
        },
        BootstrapRequest::Status => match handle.state().await {
            Ok(state) => BootstrapResponse::Status {
                state: state.label(),
            },
            Err(error) => BootstrapResponse::error(error.to_string()),
        },
    }
}

/// Serves requests from `reader` until end of input.
///
/// Each request is answered on its own task, so a status query is not held
/// up behind a pending `init`. The session ends once input is exhausted and
/// every outstanding answer has been written.
///
/// # Errors
///
/// Returns a [`ProtocolError`] when the transport fails or a response cannot
/// be written.
pub async fn serve<R, W>(
    handle: BootstrapHandle,
    mut reader: R,
    mut writer: W,
) -> Result<SessionSummary, ProtocolError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (responses, mut outbox) = mpsc::unbounded_channel::<BootstrapResponse>();

    let reading = async move {
        let mut summary = SessionSummary::default();
        loop {
            let request = match read_message(&mut reader).await {
                Ok(Some(line)) if line.trim_ascii().is_empty() => continue,
                Ok(Some(line)) => BootstrapRequest::parse(&line),
                Ok(None) => break,
                Err(error @ ProtocolError::RequestTooLarge { .. }) => Err(error),
                Err(error) => return Err(error),
            };
            summary.requests += 1;

            match request {
                Ok(request) => {
                    debug!(target: PROTOCOL_TARGET, ?request, "received request");
                    let handle = handle.clone();
                    let responses = responses.clone();
                    tokio::spawn(async move {
                        // The writer only goes away once the session has failed.
                        let _ignored = responses.send(answer(&handle, request).await);
                    });
                }
                Err(error) => {
                    warn!(target: PROTOCOL_TARGET, %error, "rejected request");
                    summary.rejected += 1;
                    let _ignored = responses.send(BootstrapResponse::error(error.to_string()));
                }
            }
        }
        Ok::<_, ProtocolError>(summary)
    };

    let writing = async {
        while let Some(response) = outbox.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<_, ProtocolError>(())
    };

    let (summary, ()) = tokio::try_join!(reading, writing)?;
    debug!(
        target: PROTOCOL_TARGET,
        requests = summary.requests,
        rejected = summary.rejected,
        "session finished"
    );
    Ok(summary)
}

async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buffer = Vec::new();
    let limit = u64::try_from(MAX_MESSAGE_BYTES + 1).unwrap_or(u64::MAX);
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buffer)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if buffer.len() > MAX_MESSAGE_BYTES && buffer.last() != Some(&b'\n') {
        let discarded = discard_line(reader).await?;
        return Err(ProtocolError::RequestTooLarge {
            size: buffer.len() + discarded,
            max_size: MAX_MESSAGE_BYTES,
        });
    }
    Ok(Some(buffer))
}

async fn discard_line<R>(reader: &mut R) -> Result<usize, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut discarded = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(discarded);
        }
        let newline = available.iter().position(|byte| *byte == b'\n');
        let len = available.len();
        if let Some(newline) = newline {
            reader.consume(newline + 1);
            return Ok(discarded + newline + 1);
        }
        reader.consume(len);
        discarded += len;
    }
}
