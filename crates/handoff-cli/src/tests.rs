use super::*;

use std::ffi::OsString;
use std::io::Cursor;

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct Invocation {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

impl Invocation {
    fn lines(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }
}

#[fixture]
fn root() -> TempDir {
    TempDir::new().expect("authorized root")
}

fn config_for(root: &TempDir) -> Config {
    let path = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).expect("utf8 root");
    Config {
        log_filter: String::from("off"),
        authorized_roots: vec![path],
        ..Config::default()
    }
}

fn invoke(config: Config, args: &[&str], input: &str) -> Invocation {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_with_loader(
        args.iter().map(OsString::from),
        Cursor::new(input.as_bytes().to_vec()),
        &mut stdout,
        &mut stderr,
        &StaticConfigLoader { config },
    );
    Invocation {
        code,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[rstest]
fn help_is_written_to_stdout(root: TempDir) {
    let result = invoke(config_for(&root), &["handoff", "--help"], "");
    assert_eq!(result.code, ExitCode::SUCCESS);
    assert!(result.stdout.contains("module-host"));
    assert!(result.stderr.is_empty());
}

#[rstest]
fn missing_subcommand_is_a_usage_error(root: TempDir) {
    let result = invoke(config_for(&root), &["handoff"], "");
    assert_eq!(result.code, ExitCode::from(2));
    assert!(result.stderr.contains("Usage"));
}

#[rstest]
fn relative_path_is_rejected(root: TempDir) {
    let result = invoke(config_for(&root), &["handoff", "open", "report.pdf"], "");
    assert_eq!(result.code, ExitCode::from(1));
    let lines = result.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().map(|line| &line["code"]), Some(&json!("INVALID_ARGUMENT")));
}

#[rstest]
fn missing_file_reports_open_error(root: TempDir) {
    let path = root.path().join("absent.pdf");
    let path = path.to_str().expect("utf8 path");
    let result = invoke(config_for(&root), &["handoff", "open", path], "");

    assert_eq!(result.code, ExitCode::from(1));
    let lines = result.lines();
    let response = lines.first().expect("one response");
    assert_eq!(response["kind"], "error");
    assert_eq!(response["code"], "FILE_OPEN_ERROR");
    assert_eq!(response["message"], "Unable to open file");
}

#[rstest]
fn serve_answers_each_line(root: TempDir) {
    let input = "{\"method\":\"openFile\"}\n\n{\"method\":\"closeFile\"}\nnot json\n";
    let result = invoke(config_for(&root), &["handoff", "serve"], input);

    assert_eq!(result.code, ExitCode::SUCCESS);
    let lines = result.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines.first().map(|line| &line["code"]),
        Some(&json!("INVALID_ARGUMENT"))
    );
    assert_eq!(
        lines.get(1),
        Some(&json!({"kind": "not_implemented", "method": "closeFile"}))
    );
    assert_eq!(
        lines.get(2).map(|line| &line["code"]),
        Some(&json!("MALFORMED_REQUEST"))
    );
}

#[rstest]
fn module_host_requires_an_artifact(root: TempDir) {
    let result = invoke(config_for(&root), &["handoff", "module-host"], "");
    assert_eq!(result.code, ExitCode::from(2));
    assert!(result.stderr.contains("no module artifact configured"));
    assert!(result.stdout.is_empty());
}
