// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local process adapter: detached spawn plus `kill`-based signalling

use super::{MonitorInvocation, ProcessAdapter, ProcessError};
use crate::subprocess::{run_with_timeout, SIGNAL_TIMEOUT};
use async_trait::async_trait;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Interval between liveness checks while waiting for a signalled process
const EXIT_POLL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct LocalProcesses {
    grace: Duration,
}

impl Default for LocalProcesses {
    fn default() -> Self {
        Self {
            grace: crate::env::kill_grace(),
        }
    }
}

impl LocalProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }

    async fn wait_for_exit(&self, pid: u32) -> bool {
        let start = Instant::now();
        while start.elapsed() < self.grace {
            if !process_exists(pid).await {
                return true;
            }
            tokio::time::sleep(EXIT_POLL).await;
        }
        !process_exists(pid).await
    }
}

#[async_trait]
impl ProcessAdapter for LocalProcesses {
    async fn spawn_monitor(&self, invocation: &MonitorInvocation) -> Result<u32, ProcessError> {
        let mut cmd = Command::new(&invocation.binary);
        cmd.args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        // Own process group: survives the submitting terminal's hangup
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| {
            ProcessError::SpawnFailed(format!("{}: {}", invocation.binary.display(), e))
        })?;
        let pid = child.id();
        // Reap the monitor if it exits while we are still running
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(pid)
    }

    async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        if !process_exists(pid).await {
            return Ok(());
        }
        send_signal("-15", pid).await;
        if self.wait_for_exit(pid).await {
            return Ok(());
        }
        send_signal("-9", pid).await;
        if self.wait_for_exit(pid).await {
            Ok(())
        } else {
            Err(ProcessError::SignalFailed {
                pid,
                reason: "process survived SIGKILL".to_string(),
            })
        }
    }

    async fn is_alive(&self, pid: u32) -> bool {
        process_exists(pid).await
    }
}

async fn send_signal(signal: &str, pid: u32) -> bool {
    let mut cmd = tokio::process::Command::new("kill");
    cmd.args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    run_with_timeout(cmd, SIGNAL_TIMEOUT, "kill")
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

async fn process_exists(pid: u32) -> bool {
    send_signal("-0", pid).await
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
