// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn spawn_sleeper() -> u32 {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id();
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    pid
}

#[tokio::test]
async fn kill_terminates_running_process() {
    let processes = LocalProcesses::with_grace(Duration::from_secs(2));
    let pid = spawn_sleeper();
    assert!(processes.is_alive(pid).await);

    processes.kill(pid).await.unwrap();
    assert!(!processes.is_alive(pid).await);
}

#[tokio::test]
async fn killing_an_exited_process_is_ok() {
    let processes = LocalProcesses::with_grace(Duration::from_millis(200));
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();

    processes.kill(pid).await.unwrap();
}

#[tokio::test]
async fn spawn_of_missing_binary_fails() {
    let processes = LocalProcesses::new();
    let invocation = MonitorInvocation {
        binary: PathBuf::from("/nonexistent/mcjob-monitor"),
        user: "alice".to_string(),
        timeout_secs: 60,
        min_particles: 1,
        uncertainty_goal: 0.0,
        poll_interval_secs: 1,
        workspace: PathBuf::from("/tmp"),
        daemon: true,
        config: None,
    };
    let err = processes.spawn_monitor(&invocation).await.unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed(_)));
    assert!(err.to_string().contains("mcjob-monitor"));
}
