// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::process::Command;

#[tokio::test]
async fn captures_trimmed_stdout() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo '  cluster 42  '"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert_eq!(exit_code(&output), 0);
    assert_eq!(stdout_text(&output), "cluster 42");
}

#[tokio::test]
async fn nonzero_exit_is_returned_not_raised() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo oops >&2; exit 3"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "failing")
        .await
        .unwrap();
    assert_eq!(exit_code(&output), 3);
    assert_eq!(stderr_text(&output), "oops");
}

#[tokio::test]
async fn missing_binary_names_the_call() {
    let cmd = Command::new("/nonexistent/condor_submit_dag");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "condor_submit_dag")
        .await
        .unwrap_err();
    assert!(err.starts_with("condor_submit_dag failed:"), "got: {}", err);
}

#[tokio::test]
async fn slow_command_times_out() {
    let mut cmd = Command::new("sleep");
    cmd.arg("10");
    let err = run_with_timeout(cmd, Duration::from_millis(100), "condor_q")
        .await
        .unwrap_err();
    assert!(err.contains("condor_q timed out"), "got: {}", err);
}
