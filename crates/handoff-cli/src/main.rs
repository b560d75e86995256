//! Entrypoint for the `handoff` binary.
//!
//! All work happens in [`handoff_cli::run`], which loads configuration,
//! installs telemetry and dispatches to the selected subcommand.

use std::io::{self, BufReader};
use std::process::ExitCode;

fn main() -> ExitCode {
    // The standard streams stay unlocked: `module-host` reads and writes them
    // from tokio's blocking pool.
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    handoff_cli::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
