// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MonitorInvocation, ProcessAdapter, ProcessError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Recorded process call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessCall {
    Spawn(MonitorInvocation),
    Kill { pid: u32 },
}

struct FakeProcessState {
    calls: Vec<ProcessCall>,
    alive: HashSet<u32>,
    next_pid: u32,
    fail_spawn: bool,
    fail_kill: bool,
}

/// Fake process adapter; spawned monitors stay "alive" until killed
#[derive(Clone)]
pub struct FakeProcesses {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcesses {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                calls: Vec::new(),
                alive: HashSet::new(),
                next_pid: 40_000,
                fail_spawn: false,
                fail_kill: false,
            })),
        }
    }
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Invocations passed to `spawn_monitor`, in order
    pub fn spawned(&self) -> Vec<MonitorInvocation> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Spawn(inv) => Some(inv.clone()),
                ProcessCall::Kill { .. } => None,
            })
            .collect()
    }

    pub fn set_fail_spawn(&self, fail: bool) {
        self.inner.lock().fail_spawn = fail;
    }

    pub fn set_fail_kill(&self, fail: bool) {
        self.inner.lock().fail_kill = fail;
    }

    /// Simulate the process exiting on its own
    pub fn set_exited(&self, pid: u32) {
        self.inner.lock().alive.remove(&pid);
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcesses {
    async fn spawn_monitor(&self, invocation: &MonitorInvocation) -> Result<u32, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Spawn(invocation.clone()));
        if inner.fail_spawn {
            return Err(ProcessError::SpawnFailed(format!(
                "{}: not found",
                invocation.binary.display()
            )));
        }
        inner.next_pid += 1;
        let pid = inner.next_pid;
        inner.alive.insert(pid);
        Ok(pid)
    }

    async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Kill { pid });
        if inner.fail_kill {
            return Err(ProcessError::SignalFailed {
                pid,
                reason: "operation not permitted".to_string(),
            });
        }
        inner.alive.remove(&pid);
        Ok(())
    }

    async fn is_alive(&self, pid: u32) -> bool {
        self.inner.lock().alive.contains(&pid)
    }
}
