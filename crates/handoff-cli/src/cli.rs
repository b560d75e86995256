//! Command-line interface definitions for the `handoff` binary.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Hands local files to external viewers and hosts the shared module.
#[derive(Parser, Debug)]
#[command(name = "handoff", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Opens a single file and prints the bridge response.
    Open {
        /// Absolute path of the file to open.
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Serves bridge method calls as JSONL over stdin and stdout.
    Serve,
    /// Serves the module bootstrap protocol as JSONL over stdin and stdout.
    ModuleHost {
        /// Module artifact to load; overrides the configured `module_artifact`.
        #[arg(long, value_name = "PATH")]
        artifact: Option<Utf8PathBuf>,
    },
}
