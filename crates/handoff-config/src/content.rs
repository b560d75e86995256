use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Strategy used to derive a content-type hint from a file path.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentTypePolicy {
    /// Always use the configured default content type.
    #[default]
    Fixed,
    /// Map well-known extensions, falling back to the default content type.
    Extension,
}

/// Errors encountered while parsing a [`ContentTypePolicy`] from text.
pub type ContentTypePolicyParseError = strum::ParseError;
