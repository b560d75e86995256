//! Command-line runtime for the `handoff` binary.
//!
//! The runtime owns argument parsing, configuration bootstrapping, telemetry
//! and subcommand dispatch:
//!
//! - `open <PATH>` opens one file and prints the bridge response as a JSON
//!   line;
//! - `serve` answers bridge method calls read as JSONL from stdin;
//! - `module-host` answers module bootstrap messages read as JSONL from stdin.
//!
//! Exit status is 0 on success, 1 when a request fails and 2 when the
//! invocation, configuration or telemetry setup is unusable.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use handoff_bootstrap::{ArtifactInitializer, ModuleHost, protocol};
use handoff_bridge::dispatch::{self, BridgeResponse, MethodTable, ResponseWriter};
use handoff_bridge::{OpenBridge, OpenRequest};
use handoff_config::Config;
use tokio::io::BufReader;
use tracing::info;

mod cli;
mod config;
mod errors;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigArgumentSplit, ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::{AppError, REQUEST_FAILURE};

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Runs the CLI with the provided arguments and streams.
///
/// `stdin` feeds `serve`; `module-host` always talks to the process's own
/// standard streams because it runs on an async runtime.
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    } = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(command_arguments) {
        Ok(cli) => cli,
        Err(error)
            if matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = write!(stdout, "{}", error.render());
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(&AppError::CliUsage(error), stderr),
    };

    match execute(cli.command, &config_arguments, stdin, stdout, loader) {
        Ok(code) => code,
        Err(error) => report(&error, stderr),
    }
}

fn report<E: Write>(error: &AppError, stderr: &mut E) -> ExitCode {
    let _ = writeln!(stderr, "{error}");
    error.exit_code()
}

fn execute<R, W, L>(
    command: CliCommand,
    config_arguments: &[OsString],
    stdin: R,
    stdout: &mut W,
    loader: &L,
) -> Result<ExitCode, AppError>
where
    R: BufRead,
    W: Write,
    L: ConfigLoader,
{
    let config = loader.load(config_arguments)?;
    telemetry::initialise(&config.log_settings())?;

    match command {
        CliCommand::Open { path } => open_file(&config, path, stdout),
        CliCommand::Serve => serve_bridge(&config, stdin, stdout),
        CliCommand::ModuleHost { artifact } => host_module(&config, artifact),
    }
}

fn open_file<W: Write>(
    config: &Config,
    path: String,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let bridge = OpenBridge::from_config(config);
    let outcome = bridge.open(&OpenRequest::new(path));
    let response = BridgeResponse::from(&outcome);

    ResponseWriter::new(stdout).write_response(&response)?;

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(REQUEST_FAILURE)
    })
}

fn serve_bridge<R, W>(config: &Config, stdin: R, stdout: &mut W) -> Result<ExitCode, AppError>
where
    R: BufRead,
    W: Write,
{
    let bridge = OpenBridge::from_config(config);
    let table = MethodTable::for_bridge();
    info!(target: CLI_TARGET, "serving bridge requests");
    let summary = dispatch::serve(&table, &bridge, stdin, stdout)?;
    info!(
        target: CLI_TARGET,
        requests = summary.requests,
        rejected = summary.rejected,
        "bridge session finished"
    );
    Ok(ExitCode::SUCCESS)
}

fn host_module(config: &Config, artifact: Option<Utf8PathBuf>) -> Result<ExitCode, AppError> {
    let path = artifact
        .or_else(|| config.module_artifact().map(ToOwned::to_owned))
        .ok_or(AppError::MissingArtifact)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    let summary = runtime.block_on(async move {
        info!(target: CLI_TARGET, artifact = %path, "serving module bootstrap requests");
        let handle = ModuleHost::new(ArtifactInitializer::new(path)).spawn();
        protocol::serve(
            handle,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await
    })?;
    info!(
        target: CLI_TARGET,
        requests = summary.requests,
        rejected = summary.rejected,
        "module host session finished"
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests;
