// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{MonitorInvocation, ProcessAdapter, ProcessError};
use crate::scheduler::{SchedulerAdapter, SchedulerError, SubmitOutput, WorkflowState};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any SchedulerAdapter
#[derive(Clone)]
pub struct TracedScheduler<S> {
    inner: S,
}

impl<S> TracedScheduler<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SchedulerAdapter> SchedulerAdapter for TracedScheduler<S> {
    async fn submit(&self, workflow: &Path, workdir: &Path) -> Result<SubmitOutput, SchedulerError> {
        async {
            tracing::info!("submitting");
            let start = std::time::Instant::now();
            let result = self.inner.submit(workflow, workdir).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(out) if out.succeeded() => tracing::info!(
                    handle = out.handle.as_deref().unwrap_or_default(),
                    elapsed_ms,
                    "workflow submitted"
                ),
                Ok(out) => tracing::error!(
                    exit_code = out.exit_code,
                    message = %out.message,
                    elapsed_ms,
                    "submission rejected"
                ),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "submit failed"),
            }
            result
        }
        .instrument(tracing::info_span!("scheduler.submit", workflow = %workflow.display()))
        .await
    }

    async fn query(&self, handle: &str) -> Result<WorkflowState, SchedulerError> {
        let result = self.inner.query(handle).await;
        match &result {
            Ok(state) => tracing::debug!(
                handle,
                active = state.active_tasks,
                finished = state.finished,
                failed = state.failed,
                "queried"
            ),
            Err(e) => tracing::warn!(handle, error = %e, "query failed"),
        }
        result
    }

    async fn remove(&self, handle: &str) -> Result<(), SchedulerError> {
        let result = self.inner.remove(handle).await;
        tracing::info_span!("scheduler.remove", handle).in_scope(|| match &result {
            Ok(()) => tracing::info!("removed"),
            Err(e) => tracing::error!(error = %e, "remove failed"),
        });
        result
    }
}

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcesses<P> {
    inner: P,
}

impl<P> TracedProcesses<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcesses<P> {
    async fn spawn_monitor(&self, invocation: &MonitorInvocation) -> Result<u32, ProcessError> {
        let span = tracing::info_span!(
            "process.spawn_monitor",
            workspace = %invocation.workspace.display()
        );
        async {
            tracing::info!(binary = %invocation.binary.display(), "starting");
            let result = self.inner.spawn_monitor(invocation).await;
            match &result {
                Ok(pid) => tracing::info!(pid, "monitor started"),
                Err(e) => tracing::error!(error = %e, "spawn failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        let result = self.inner.kill(pid).await;
        tracing::info_span!("process.kill", pid).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::error!(error = %e, "kill failed"),
        });
        result
    }

    async fn is_alive(&self, pid: u32) -> bool {
        let alive = self.inner.is_alive(pid).await;
        tracing::trace!(pid, alive, "checked");
        alive
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
