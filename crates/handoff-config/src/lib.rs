//! Shared configuration for the handoff bridge and module host.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults first, then
//! an optional TOML file supplied with `--config-path`, then `HANDOFF_*`
//! environment variables, and finally command-line flags. Every field is
//! optional so that partial layers merge cleanly; the accessor methods on
//! [`Config`] fill in the built-in defaults.

mod command;
mod content;
mod defaults;
mod logging;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use command::{CommandTemplate, CommandTemplateParseError, Placeholder, RenderedCommand};
pub use content::{ContentTypePolicy, ContentTypePolicyParseError};
pub use defaults::{
    DEFAULT_CHOOSER_COMMAND, DEFAULT_CHOOSER_TITLE, DEFAULT_CONTENT_TYPE, DEFAULT_GRANT_TTL_SECS,
    DEFAULT_LAUNCH_COMMAND, DEFAULT_LOG_FILTER, DEFAULT_QUERY_COMMAND, default_authorized_roots,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};

/// Resolved configuration shared by every handoff binary.
///
/// The logging fields always carry a value, so the defaults layer is never
/// empty and a bare invocation with no file, environment or flags still
/// loads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "HANDOFF")]
pub struct Config {
    /// Tracing filter expression, for example `info` or `handoff_bridge=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// How the bridge derives a content-type hint from a path.
    #[serde(default)]
    pub content_type_policy: Option<ContentTypePolicy>,
    /// Content type used by the `fixed` policy and as the `extension` fallback.
    #[serde(default)]
    pub default_content_type: Option<String>,
    /// Title shown by the generic viewer chooser.
    #[serde(default)]
    pub chooser_title: Option<String>,
    /// Directories under which files may be exposed to external viewers.
    #[serde(default)]
    pub authorized_roots: Vec<Utf8PathBuf>,
    /// Lifetime of a read grant handed to a launched viewer, in seconds.
    #[serde(default)]
    pub grant_ttl_secs: Option<u64>,
    /// Command used to look up the viewer registered for a content type.
    #[serde(default)]
    pub query_command: Option<CommandTemplate>,
    /// Command used to launch a specific viewer.
    #[serde(default)]
    pub launch_command: Option<CommandTemplate>,
    /// Command used to present the generic "open with" chooser.
    #[serde(default)]
    pub chooser_command: Option<CommandTemplate>,
    /// Location of the shared module artifact initialised by `module-host`.
    #[serde(default)]
    pub module_artifact: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            content_type_policy: None,
            default_content_type: None,
            chooser_title: None,
            authorized_roots: Vec::new(),
            grant_ttl_secs: None,
            query_command: None,
            launch_command: None,
            chooser_command: None,
            module_artifact: None,
        }
    }
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the filter and format pair consumed by telemetry setup.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_filter(), self.log_format())
    }

    /// Returns the content-type derivation policy.
    #[must_use]
    pub fn content_type_policy(&self) -> ContentTypePolicy {
        self.content_type_policy.unwrap_or_default()
    }

    /// Returns the default content type.
    #[must_use]
    pub fn default_content_type(&self) -> &str {
        self.default_content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Returns the chooser title.
    #[must_use]
    pub fn chooser_title(&self) -> &str {
        self.chooser_title.as_deref().unwrap_or(DEFAULT_CHOOSER_TITLE)
    }

    /// Returns the authorized roots, falling back to the platform defaults
    /// when none are configured.
    #[must_use]
    pub fn authorized_roots(&self) -> Vec<Utf8PathBuf> {
        if self.authorized_roots.is_empty() {
            default_authorized_roots()
        } else {
            self.authorized_roots.clone()
        }
    }

    /// Returns the lifetime of a viewer read grant.
    #[must_use]
    pub fn grant_ttl(&self) -> Duration {
        Duration::from_secs(self.grant_ttl_secs.unwrap_or(DEFAULT_GRANT_TTL_SECS))
    }

    /// Returns the viewer query command.
    #[must_use]
    pub fn query_command(&self) -> CommandTemplate {
        self.query_command
            .clone()
            .unwrap_or_else(|| CommandTemplate::builtin(DEFAULT_QUERY_COMMAND))
    }

    /// Returns the viewer launch command.
    #[must_use]
    pub fn launch_command(&self) -> CommandTemplate {
        self.launch_command
            .clone()
            .unwrap_or_else(|| CommandTemplate::builtin(DEFAULT_LAUNCH_COMMAND))
    }

    /// Returns the chooser command.
    #[must_use]
    pub fn chooser_command(&self) -> CommandTemplate {
        self.chooser_command
            .clone()
            .unwrap_or_else(|| CommandTemplate::builtin(DEFAULT_CHOOSER_COMMAND))
    }

    /// Returns the configured module artifact path, if any.
    #[must_use]
    pub fn module_artifact(&self) -> Option<&Utf8Path> {
        self.module_artifact.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.content_type_policy(), ContentTypePolicy::Fixed);
        assert_eq!(config.default_content_type(), "application/pdf");
        assert_eq!(config.chooser_title(), "Open file with");
        assert_eq!(config.grant_ttl(), Duration::from_secs(300));
        assert!(config.module_artifact().is_none());
    }

    #[rstest]
    fn configured_roots_replace_defaults() {
        let config = Config {
            authorized_roots: vec![Utf8PathBuf::from("/srv/documents")],
            ..Config::default()
        };
        assert_eq!(
            config.authorized_roots(),
            vec![Utf8PathBuf::from("/srv/documents")]
        );
    }

    #[rstest]
    fn default_commands_match_builtins() {
        let config = Config::default();
        assert_eq!(config.query_command().to_string(), DEFAULT_QUERY_COMMAND);
        assert_eq!(config.launch_command().to_string(), DEFAULT_LAUNCH_COMMAND);
        assert_eq!(config.chooser_command().to_string(), DEFAULT_CHOOSER_COMMAND);
    }
}
