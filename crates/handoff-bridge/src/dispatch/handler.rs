//! JSONL session loop.
//!
//! Reads one request per line, answers each with exactly one response line,
//! and stops at end of input. Undecodable or oversized lines are answered
//! with `MALFORMED_REQUEST` without ending the session.

use std::io::{BufRead, Read, Write};

use tracing::{debug, warn};

use super::errors::DispatchError;
use super::request::BridgeRequest;
use super::response::{BridgeResponse, ErrorCode, ResponseWriter};
use super::router::{DISPATCH_TARGET, MethodTable};

/// Maximum size of a single request line in bytes.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Counters describing a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines that produced a response.
    pub requests: usize,
    /// Lines answered with `MALFORMED_REQUEST`.
    pub rejected: usize,
}

/// Decodes and dispatches a single request line.
pub fn handle_line<C>(table: &MethodTable<C>, context: &C, line: &[u8]) -> BridgeResponse {
    match BridgeRequest::parse(line) {
        Ok(request) => table.dispatch(context, &request),
        Err(error) => {
            warn!(target: DISPATCH_TARGET, %error, "malformed request");
            BridgeResponse::malformed(&error)
        }
    }
}

/// Serves requests from `reader` until end of input.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns a [`DispatchError`] when the transport fails or a response cannot
/// be written.
pub fn serve<C, R, W>(
    table: &MethodTable<C>,
    context: &C,
    mut reader: R,
    writer: W,
) -> Result<SessionSummary, DispatchError>
where
    R: BufRead,
    W: Write,
{
    let mut writer = ResponseWriter::new(writer);
    let mut summary = SessionSummary::default();

    loop {
        let response = match read_request_line(&mut reader) {
            Ok(Some(line)) if line.trim_ascii().is_empty() => continue,
            Ok(Some(line)) => handle_line(table, context, &line),
            Ok(None) => break,
            Err(error) if error.is_recoverable() => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request line");
                BridgeResponse::malformed(&error)
            }
            Err(error) => return Err(error),
        };

        if matches!(
            response,
            BridgeResponse::Error {
                code: ErrorCode::MalformedRequest,
                ..
            }
        ) {
            summary.rejected += 1;
        }
        summary.requests += 1;
        writer.write_response(&response)?;
    }

    debug!(
        target: DISPATCH_TARGET,
        requests = summary.requests,
        rejected = summary.rejected,
        "session finished"
    );
    Ok(summary)
}

/// Reads one newline-terminated line of at most [`MAX_REQUEST_BYTES`].
///
/// An oversized line is consumed up to its newline before the error is
/// returned, so the next call starts on a fresh request.
fn read_request_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut buffer)?;
    if read == 0 {
        return Ok(None);
    }
    if buffer.len() > MAX_REQUEST_BYTES && buffer.last() != Some(&b'\n') {
        let discarded = discard_line(reader)?;
        return Err(DispatchError::request_too_large(
            buffer.len() + discarded,
            MAX_REQUEST_BYTES,
        ));
    }
    Ok(Some(buffer))
}

fn discard_line<R: BufRead>(reader: &mut R) -> Result<usize, DispatchError> {
    let mut discarded = 0;
    loop {
        let available = reader.fill_buf()?;
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

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn ping(_context: &(), _request: &BridgeRequest) -> BridgeResponse {
        BridgeResponse::Success
    }

    fn run(input: &[u8]) -> (SessionSummary, Vec<String>) {
        let table = MethodTable::new().with_method("ping", ping);
        let mut output = Vec::new();
        let summary = serve(&table, &(), Cursor::new(input.to_vec()), &mut output).expect("serve");
        let text = String::from_utf8(output).expect("utf8");
        (summary, text.lines().map(str::to_owned).collect())
    }

    #[rstest]
    fn answers_each_line_in_order() {
        let (summary, lines) = run(b"{\"method\":\"ping\"}\n\n{\"method\":\"share\"}\n");
        assert_eq!(
            lines,
            vec![
                "{\"kind\":\"success\"}",
                "{\"kind\":\"not_implemented\",\"method\":\"share\"}",
            ]
        );
        assert_eq!(summary, SessionSummary { requests: 2, rejected: 0 });
    }

    #[rstest]
    fn malformed_line_does_not_end_session() {
        let (summary, lines) = run(b"garbage\n{\"method\":\"ping\"}");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"code\":\"MALFORMED_REQUEST\""));
        assert_eq!(lines[1], "{\"kind\":\"success\"}");
        assert_eq!(summary.rejected, 1);
    }

    #[rstest]
    fn oversized_line_is_rejected_and_skipped() {
        let mut input = vec![b'x'; MAX_REQUEST_BYTES + 10];
        input.extend_from_slice(b"\n{\"method\":\"ping\"}\n");
        let (summary, lines) = run(&input);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("request too large"));
        assert_eq!(lines[1], "{\"kind\":\"success\"}");
        assert_eq!(summary, SessionSummary { requests: 2, rejected: 1 });
    }
}
