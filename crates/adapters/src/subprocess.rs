// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for scheduler CLI calls (submit, query, remove).
pub const SCHEDULER_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single `kill` invocation.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a command, failing with a readable message on spawn error or timeout.
///
/// A non-zero exit status is returned as `Ok`; callers decide what it means.
/// The child is killed if the timeout elapses.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Trimmed stdout as text
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Trimmed stderr as text
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Exit code, with `-1` standing in for death by signal
pub fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
