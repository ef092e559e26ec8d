// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor process adapters

mod local;

pub use local::LocalProcesses;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcesses, ProcessCall};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("failed to signal pid {pid}: {reason}")]
    SignalFailed { pid: u32, reason: String },
}

/// Command line of a job-control monitor bound to one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInvocation {
    pub binary: PathBuf,
    pub user: String,
    pub timeout_secs: u64,
    pub min_particles: u64,
    pub uncertainty_goal: f64,
    pub poll_interval_secs: u64,
    pub workspace: PathBuf,
    pub daemon: bool,
    /// Config file forwarded with `-c`
    pub config: Option<PathBuf>,
}

impl MonitorInvocation {
    /// `-l <user> -t <secs> -n <min> -u <goal> -p <secs> -w <workspace> [-d] [-c <config>]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-l".to_string(),
            self.user.clone(),
            "-t".to_string(),
            self.timeout_secs.to_string(),
            "-n".to_string(),
            self.min_particles.to_string(),
            "-u".to_string(),
            self.uncertainty_goal.to_string(),
            "-p".to_string(),
            self.poll_interval_secs.to_string(),
            "-w".to_string(),
            self.workspace.display().to_string(),
        ];
        if self.daemon {
            args.push("-d".to_string());
        }
        if let Some(config) = &self.config {
            args.push("-c".to_string());
            args.push(config.display().to_string());
        }
        args
    }
}

/// Adapter for starting and stopping monitor processes
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start a detached monitor; returns its pid
    async fn spawn_monitor(&self, invocation: &MonitorInvocation) -> Result<u32, ProcessError>;

    /// Terminate a process (SIGTERM, then SIGKILL after a grace period)
    async fn kill(&self, pid: u32) -> Result<(), ProcessError>;

    async fn is_alive(&self, pid: u32) -> bool;
}
