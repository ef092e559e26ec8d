// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scheduler adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SchedulerAdapter, SchedulerError, SubmitOutput, WorkflowState};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded scheduler call
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCall {
    Submit { workflow: PathBuf, workdir: PathBuf },
    Query { handle: String },
    Remove { handle: String },
}

struct FakeSchedulerState {
    calls: Vec<SchedulerCall>,
    states: HashMap<String, WorkflowState>,
    next_cluster: u64,
    submit_exit_code: i32,
    fail_remove: bool,
}

/// In-memory scheduler; workflows start with no active tasks
#[derive(Clone)]
pub struct FakeScheduler {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl Default for FakeScheduler {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSchedulerState {
                calls: Vec::new(),
                states: HashMap::new(),
                next_cluster: 100,
                submit_exit_code: 0,
                fail_remove: false,
            })),
        }
    }
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.inner.lock().calls.clone()
    }

    /// Make subsequent submissions exit with `code`
    pub fn set_submit_exit_code(&self, code: i32) {
        self.inner.lock().submit_exit_code = code;
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.inner.lock().fail_remove = fail;
    }

    pub fn set_state(&self, handle: &str, state: WorkflowState) {
        self.inner.lock().states.insert(handle.to_string(), state);
    }

    pub fn state(&self, handle: &str) -> Option<WorkflowState> {
        self.inner.lock().states.get(handle).copied()
    }

    pub fn removed(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SchedulerCall::Remove { handle } => Some(handle.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SchedulerAdapter for FakeScheduler {
    async fn submit(&self, workflow: &Path, workdir: &Path) -> Result<SubmitOutput, SchedulerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SchedulerCall::Submit {
            workflow: workflow.to_path_buf(),
            workdir: workdir.to_path_buf(),
        });

        if inner.submit_exit_code != 0 {
            return Ok(SubmitOutput {
                exit_code: inner.submit_exit_code,
                handle: None,
                message: "fake submission rejected".to_string(),
            });
        }

        inner.next_cluster += 1;
        let handle = inner.next_cluster.to_string();
        inner.states.insert(handle.clone(), WorkflowState::default());
        Ok(SubmitOutput {
            exit_code: 0,
            handle: Some(handle),
            message: String::new(),
        })
    }

    async fn query(&self, handle: &str) -> Result<WorkflowState, SchedulerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SchedulerCall::Query {
            handle: handle.to_string(),
        });
        inner
            .states
            .get(handle)
            .copied()
            .ok_or_else(|| SchedulerError::UnknownHandle(handle.to_string()))
    }

    async fn remove(&self, handle: &str) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SchedulerCall::Remove {
            handle: handle.to_string(),
        });
        if inner.fail_remove {
            return Err(SchedulerError::CommandFailed(format!(
                "condor_rm {}: permission denied",
                handle
            )));
        }
        match inner.states.get_mut(handle) {
            Some(state) => {
                *state = WorkflowState::failed();
                Ok(())
            }
            None => Err(SchedulerError::UnknownHandle(handle.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
