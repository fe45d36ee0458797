//! Running the external converter and OCR programs.

use crate::error::ToolFailure;
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// How many trailing stderr lines are kept for diagnostics.
const STDERR_TAIL_LINES: usize = 5;

/// Run `program args…` to completion. Succeeds only on exit status 0.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<(), ToolFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {:?}", cmd.as_std());

    let output = cmd.output().await.map_err(|e| ToolFailure {
        program: program.to_string(),
        exit_code: None,
        detail: format!("failed to start: {e}"),
    })?;

    if output.status.success() {
        return Ok(());
    }

    Err(ToolFailure {
        program: program.to_string(),
        exit_code: output.status.code(),
        detail: stderr_tail(&output.stderr),
    })
}

/// Check that `program` can be started at all, by running `program --version`.
///
/// Only a spawn failure (not installed, not executable) is an error; the exit
/// status is ignored because some tools exit non-zero for `--version`.
pub async fn probe_tool(program: &str) -> Result<(), String> {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
