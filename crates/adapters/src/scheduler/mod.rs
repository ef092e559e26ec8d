// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster scheduler adapters

mod condor;

pub use condor::CondorScheduler;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScheduler, SchedulerCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler command failed: {0}")]
    CommandFailed(String),
    #[error("unexpected scheduler output: {0}")]
    Parse(String),
    #[error("unknown workflow: {0}")]
    UnknownHandle(String),
}

/// Result of handing a workflow descriptor to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutput {
    pub exit_code: i32,
    /// Cluster id of the workflow, present when `exit_code == 0`
    pub handle: Option<String>,
    /// Scheduler diagnostics (stderr)
    pub message: String,
}

impl SubmitOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.handle.is_some()
    }
}

/// Snapshot of a submitted workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowState {
    /// Compute tasks idle or running
    pub active_tasks: u32,
    /// Workflow left the queue
    pub finished: bool,
    /// Workflow failed or was removed
    pub failed: bool,
}

impl WorkflowState {
    pub fn active(tasks: u32) -> Self {
        Self {
            active_tasks: tasks,
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            finished: true,
            ..Self::default()
        }
    }

    pub fn failed() -> Self {
        Self {
            finished: true,
            failed: true,
            ..Self::default()
        }
    }
}

/// Adapter for the external cluster scheduler
#[async_trait]
pub trait SchedulerAdapter: Clone + Send + Sync + 'static {
    /// Enqueue the workflow descriptor, run from `workdir`
    async fn submit(&self, workflow: &Path, workdir: &Path) -> Result<SubmitOutput, SchedulerError>;

    /// Current state of a submitted workflow
    async fn query(&self, handle: &str) -> Result<WorkflowState, SchedulerError>;

    /// Remove the workflow and all of its tasks
    async fn remove(&self, handle: &str) -> Result<(), SchedulerError>;
}
