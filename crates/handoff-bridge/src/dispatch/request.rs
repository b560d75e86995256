//! Request decoding for the method table.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::DispatchError;

/// A decoded bridge call: a method name plus its named arguments.
///
/// Arguments sit beside the method on the wire:
///
/// ```json
/// {"method":"openFile","path":"/home/user/report.pdf"}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeRequest {
    method: String,
    #[serde(flatten)]
    arguments: Map<String, Value>,
}

impl BridgeRequest {
    /// Builds a request programmatically.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    /// Adds a named argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Parses one JSONL line.
    ///
    /// Trailing whitespace, including the newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedRequest`] for empty or unparsable
    /// lines and [`DispatchError::InvalidStructure`] when the method is blank.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        let request: Self =
            serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        if request.method().is_empty() {
            return Err(DispatchError::invalid_structure("method field is empty"));
        }
        Ok(request)
    }

    /// Returns the method name, trimmed.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.trim()
    }

    /// Returns a string argument. Absent, `null` and non-string values all
    /// read as `None`.
    #[must_use]
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }
}
