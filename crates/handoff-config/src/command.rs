use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substitution markers recognised inside a [`CommandTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{type}`: the content type being queried or launched.
    ContentType,
    /// `{viewer}`: the viewer identifier returned by the query command.
    Viewer,
    /// `{uri}`: the `file://` URI of the shared resource.
    Uri,
    /// `{path}`: the canonical filesystem path of the shared resource.
    Path,
    /// `{title}`: the title shown by the generic chooser.
    Title,
    /// `{ttl}`: lifetime of the viewer's read grant, in whole seconds.
    GrantTtlSecs,
}

impl Placeholder {
    /// Returns the marker text, braces included.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::ContentType => "{type}",
            Self::Viewer => "{viewer}",
            Self::Uri => "{uri}",
            Self::Path => "{path}",
            Self::Title => "{title}",
            Self::GrantTtlSecs => "{ttl}",
        }
    }
}

/// Whitespace-separated command line with `{placeholder}` markers.
///
/// The first token names the program; the rest are arguments. Tokens are not
/// passed through a shell, so quoting is neither needed nor interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandTemplate {
    tokens: Vec<String>,
}

impl CommandTemplate {
    /// Builds a template from a compiled-in command string.
    ///
    /// Empty input yields a template whose program is the empty string, which
    /// fails at spawn time rather than here.
    #[must_use]
    pub fn builtin(command: &str) -> Self {
        Self {
            tokens: command.split_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Substitutes placeholders and splits the result into program and
    /// arguments.
    ///
    /// Markers with no supplied value are left untouched.
    #[must_use]
    pub fn render(&self, substitutions: &[(Placeholder, &str)]) -> RenderedCommand {
        let mut rendered = self.tokens.iter().map(|token| {
            substitutions
                .iter()
                .fold(token.clone(), |acc, (placeholder, value)| {
                    acc.replace(placeholder.marker(), value)
                })
        });
        let program = rendered.next().unwrap_or_default();
        RenderedCommand {
            program,
            args: rendered.collect(),
        }
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.tokens.join(" "))
    }
}

impl FromStr for CommandTemplate {
    type Err = CommandTemplateParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let template = Self::builtin(input);
        if template.tokens.is_empty() {
            return Err(CommandTemplateParseError::Empty);
        }
        Ok(template)
    }
}

impl TryFrom<String> for CommandTemplate {
    type Error = CommandTemplateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommandTemplate> for String {
    fn from(template: CommandTemplate) -> Self {
        template.to_string()
    }
}

/// Errors encountered while parsing a [`CommandTemplate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandTemplateParseError {
    /// The command string contained no program.
    #[error("command template is empty")]
    Empty,
}

/// Concrete program and argument list produced by [`CommandTemplate::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}
