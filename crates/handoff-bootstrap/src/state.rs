//! Lifecycle state and the result broadcast to callers.

use serde::Serialize;

/// Lifecycle of the shared module.
///
/// Transitions are one-way: `Uninitialized → Initializing → Ready` or
/// `Uninitialized → Initializing → Failed`. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BootstrapState {
    /// No caller has asked for the module yet.
    Uninitialized,
    /// The single initialization attempt is running.
    Initializing,
    /// The module is available.
    Ready,
    /// Initialization failed; the message is replayed to every caller.
    Failed(String),
}

impl BootstrapState {
    /// Returns `true` for `Ready` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }

    /// Returns the stable lower-case label used on the wire.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Returns the result replayed to callers once the state is terminal.
    #[must_use]
    pub fn terminal_result(&self) -> Option<BootstrapResult> {
        match self {
            Self::Ready => Some(BootstrapResult::ready()),
            Self::Failed(error) => Some(BootstrapResult::failed(error.clone())),
            Self::Uninitialized | Self::Initializing => None,
        }
    }
}

/// Outcome delivered to every caller of
/// [`BootstrapHandle::ensure_ready`](crate::BootstrapHandle::ensure_ready).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapResult {
    /// Whether the module is ready.
    pub success: bool,
    /// Initialization error, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BootstrapResult {
    /// The successful result.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed result carrying `error` verbatim.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(BootstrapState::Uninitialized, "uninitialized", false)]
    #[case(BootstrapState::Initializing, "initializing", false)]
    #[case(BootstrapState::Ready, "ready", true)]
    #[case(BootstrapState::Failed(String::from("X")), "failed", true)]
    fn labels_and_terminality(
        #[case] state: BootstrapState,
        #[case] label: &str,
        #[case] terminal: bool,
    ) {
        assert_eq!(state.label(), label);
        assert_eq!(state.to_string(), label);
        assert_eq!(state.is_terminal(), terminal);
        assert_eq!(state.terminal_result().is_some(), terminal);
    }

    #[rstest]
    fn failure_result_carries_message_verbatim() {
        let state = BootstrapState::Failed(String::from("X"));
        assert_eq!(state.terminal_result(), Some(BootstrapResult::failed("X")));
    }

    #[rstest]
    fn ready_result_omits_error_field() {
        let json = serde_json::to_string(&BootstrapResult::ready()).expect("serialize");
        assert_eq!(json, r#"{"success":true}"#);
    }
}
