use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Content type assumed when nothing more specific is known.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Title presented by the generic viewer chooser.
pub const DEFAULT_CHOOSER_TITLE: &str = "Open file with";

/// Lifetime of a viewer read grant, in seconds.
pub const DEFAULT_GRANT_TTL_SECS: u64 = 300;

/// Queries the desktop database for the default handler of a content type.
pub const DEFAULT_QUERY_COMMAND: &str = "xdg-mime query default {type}";

/// Launches a specific desktop entry with the shared resource.
pub const DEFAULT_LAUNCH_COMMAND: &str = "gtk-launch {viewer} {uri}";

/// Hands the resource to the desktop's generic opener.
pub const DEFAULT_CHOOSER_COMMAND: &str = "xdg-open {uri}";

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned form of [`DEFAULT_LOG_FILTER`] for serde and layer defaults.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Directories exposed to viewers when no roots are configured: the user's
/// home directory and the system temporary directory.
#[must_use]
pub fn default_authorized_roots() -> Vec<Utf8PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        roots.push(home);
    }
    if let Ok(temp) = Utf8PathBuf::from_path_buf(env::temp_dir()) {
        roots.push(temp);
    }
    roots
}
