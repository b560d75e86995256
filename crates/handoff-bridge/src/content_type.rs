//! Content-type hints used to select a viewer.
//!
//! This is a policy table, not a sniffer: the hint comes from configuration
//! and, optionally, the file extension. File contents are never inspected.

use std::fmt;

use camino::Utf8Path;
use handoff_config::{Config, ContentTypePolicy};

/// Wildcard type used by the fallback chooser.
const WILDCARD: &str = "*/*";

/// Extensions understood by [`ContentTypePolicy::Extension`].
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("epub", "application/epub+zip"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("zip", "application/zip"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
];

/// A MIME-style content type such as `application/pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType(String);

impl ContentType {
    /// Wraps a content type string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The `*/*` type matching any viewer.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_owned())
    }

    /// Returns `true` for the `*/*` type.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Returns the type as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Derives content-type hints from paths according to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeResolver {
    policy: ContentTypePolicy,
    default: ContentType,
}

impl ContentTypeResolver {
    /// Builds a resolver with an explicit policy and default type.
    #[must_use]
    pub fn new(policy: ContentTypePolicy, default: ContentType) -> Self {
        Self { policy, default }
    }

    /// Builds a resolver from the shared configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.content_type_policy(),
            ContentType::new(config.default_content_type()),
        )
    }

    /// Returns the hint for `path`.
    #[must_use]
    pub fn hint_for(&self, path: &Utf8Path) -> ContentType {
        match self.policy {
            ContentTypePolicy::Fixed => self.default.clone(),
            ContentTypePolicy::Extension => path
                .extension()
                .and_then(lookup_extension)
                .map_or_else(|| self.default.clone(), ContentType::new),
        }
    }
}

fn lookup_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_TABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn resolver(policy: ContentTypePolicy) -> ContentTypeResolver {
        ContentTypeResolver::new(policy, ContentType::new("application/pdf"))
    }

    #[rstest]
    #[case("/docs/photo.png")]
    #[case("/docs/notes")]
    fn fixed_policy_ignores_extension(#[case] path: &str) {
        let hint = resolver(ContentTypePolicy::Fixed).hint_for(Utf8Path::new(path));
        assert_eq!(hint.as_str(), "application/pdf");
    }

    #[rstest]
    #[case("/docs/photo.PNG", "image/png")]
    #[case("/docs/table.csv", "text/csv")]
    #[case("/docs/archive.tar", "application/pdf")]
    #[case("/docs/no_extension", "application/pdf")]
    fn extension_policy_maps_known_extensions(#[case] path: &str, #[case] expected: &str) {
        let hint = resolver(ContentTypePolicy::Extension).hint_for(Utf8Path::new(path));
        assert_eq!(hint.as_str(), expected);
    }

    #[rstest]
    fn wildcard_is_recognised() {
        assert!(ContentType::wildcard().is_wildcard());
        assert!(!ContentType::new("text/plain").is_wildcard());
    }
}
