// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-control monitor.
//!
//! One monitor runs per workspace, in its own process, and owns the job's
//! forward status transitions. Each poll:
//!
//! - terminal status: exit
//! - soft-cancel marker: request a graceful stop, write CANCELLED, exit
//! - SUBMITTED: move to RUNNING once compute tasks are active or reporting
//! - RUNNING: evaluate the [`StopPolicy`]; on a trigger, stop the tasks, wait
//!   for them to drain, aggregate once and write FINISHED

mod aggregator;
mod cleanup;
mod lock;
mod policy;
mod progress;

pub use aggregator::{find_plan_dose, Aggregator, SchedulerAggregator};
pub use cleanup::prune_intermediates;
pub use lock::{acquire_monitor_lock, live_monitor, lock_holder};
pub use policy::StopPolicy;
pub use progress::{sample_progress, Progress, STATS_FILE};

use crate::error::JobError;
use aggregator::poll_budget;
use mc_adapters::{SchedulerAdapter, WorkflowState};
use mc_core::clock::elapsed_between;
use mc_core::config::MonitorSettings;
use mc_core::status_file::{advance, marker_present, read_status, touch_marker};
use mc_core::{Clock, FinishReason, JobRecord, Status, StatusFileError, WorkspaceLayout};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    pub policy: StopPolicy,
    pub poll_interval: Duration,
    /// Upper bound on waiting for tasks to exit after a stop request
    pub drain_timeout: Duration,
    /// Keep per-task outputs and scratch files after FINISHED (debug mode)
    pub keep_intermediates: bool,
}

impl MonitorConfig {
    pub fn new(policy: StopPolicy, settings: &MonitorSettings) -> Self {
        Self {
            policy,
            poll_interval: settings.poll_interval(),
            drain_timeout: settings.drain_timeout(),
            keep_intermediates: false,
        }
    }

    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Override the poll interval (the `-p` flag)
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// What the poll loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Exit(Status),
}

pub struct JobControlMonitor<S, A, C> {
    layout: WorkspaceLayout,
    record: JobRecord,
    scheduler: S,
    aggregator: A,
    clock: C,
    config: MonitorConfig,
    aggregated: bool,
}

impl<S, A, C> JobControlMonitor<S, A, C>
where
    S: SchedulerAdapter,
    A: Aggregator,
    C: Clock,
{
    pub fn new(
        layout: WorkspaceLayout,
        record: JobRecord,
        scheduler: S,
        aggregator: A,
        clock: C,
        config: MonitorConfig,
    ) -> Self {
        Self {
            layout,
            record,
            scheduler,
            aggregator,
            clock,
            config,
            aggregated: false,
        }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Poll until the job reaches a terminal status.
    pub async fn run(&mut self) -> Status {
        tracing::info!(
            job_id = %self.record.id,
            poll_secs = self.config.poll_interval.as_secs(),
            "monitor started"
        );
        loop {
            match self.poll_once().await {
                Ok(PollOutcome::Exit(status)) => {
                    tracing::info!(job_id = %self.record.id, %status, "monitor exiting");
                    return status;
                }
                Ok(PollOutcome::Continue) => {}
                Err(e) => {
                    tracing::warn!(job_id = %self.record.id, error = %e, "poll failed");
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One pass of the control loop.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, JobError> {
        let path = self.layout.status_path();
        let current = match read_status(&path) {
            Ok(artifact) => artifact,
            Err(e) => {
                // A writer may be mid-rename; retry next poll
                tracing::warn!(job_id = %self.record.id, error = %e, "status unreadable");
                return Ok(PollOutcome::Continue);
            }
        };
        if current.status.is_terminal() {
            return Ok(PollOutcome::Exit(current.status));
        }

        if marker_present(&self.layout.cancel_marker()) {
            tracing::info!(job_id = %self.record.id, "soft cancel requested");
            self.request_stop()?;
            let status = self.set_status(Status::Cancelled, FinishReason::SoftCancel)?;
            return Ok(PollOutcome::Exit(status));
        }

        let state = self.query().await;
        let progress = sample_progress(&self.layout.output_dir());
        let mut status = current.status;

        if status == Status::Submitted {
            if state.is_some_and(|s| s.failed) {
                let status = self.set_status(Status::Failed, FinishReason::SchedulerFailure)?;
                return Ok(PollOutcome::Exit(status));
            }
            let started =
                state.is_some_and(|s| s.active_tasks > 0 || s.finished) || progress.is_some();
            if !started {
                return Ok(PollOutcome::Continue);
            }
            status = self.advance_to_running()?;
        }

        if status != Status::Running {
            return Ok(PollOutcome::Continue);
        }
        if state.is_some_and(|s| s.failed) {
            let status = self.set_status(Status::Failed, FinishReason::SchedulerFailure)?;
            return Ok(PollOutcome::Exit(status));
        }

        let elapsed = elapsed_between(self.record.submitted_at_ms, self.clock.epoch_ms());
        if let Some(reason) = self.config.policy.evaluate(progress.as_ref(), elapsed) {
            tracing::info!(
                job_id = %self.record.id,
                %reason,
                particles = progress.as_ref().map_or(0, |p| p.particles),
                "stop condition met"
            );
            return self.trigger(reason).await.map(PollOutcome::Exit);
        }
        if state.is_some_and(|s| s.finished || s.active_tasks == 0) {
            return self.trigger(FinishReason::Completed).await.map(PollOutcome::Exit);
        }
        Ok(PollOutcome::Continue)
    }

    /// Stop, drain, aggregate once, then write FINISHED.
    ///
    /// A no-op returning the current status once the job is terminal.
    pub async fn trigger(&mut self, reason: FinishReason) -> Result<Status, JobError> {
        let path = self.layout.status_path();
        let current = read_status(&path).map_err(|e| JobError::status(&path, e))?;
        if current.status.is_terminal() {
            return Ok(current.status);
        }
        if current.status != Status::Running {
            self.advance_to_running()?;
        }

        self.request_stop()?;
        self.drain().await;

        let marker = self.layout.aggregation_marker();
        if self.aggregated || self.aggregation_done(&marker) {
            tracing::warn!(job_id = %self.record.id, "aggregation already ran, not repeating");
        } else {
            if let Err(e) = self.aggregator.aggregate(&self.layout, &self.record).await {
                tracing::error!(job_id = %self.record.id, error = %e, "aggregation failed");
                return self.set_status(Status::Failed, FinishReason::AggregationFailure);
            }
            self.aggregated = true;
            touch_marker(&marker).map_err(|e| JobError::io(&marker, e))?;
        }

        let status = self.set_status(Status::Finished, reason)?;
        tracing::info!(job_id = %self.record.id, %reason, "job finished");
        if status == Status::Finished && !self.config.keep_intermediates {
            prune_intermediates(&self.layout);
        }
        Ok(status)
    }

    /// A marker from an earlier run only counts while its plan dose exists.
    fn aggregation_done(&self, marker: &Path) -> bool {
        if !marker_present(marker) {
            return false;
        }
        match find_plan_dose(&self.layout) {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::warn!(job_id = %self.record.id, "aggregation marker without plan dose, aggregating again");
                false
            }
            Err(e) => {
                tracing::warn!(job_id = %self.record.id, error = %e, "cannot check plan dose, aggregating again");
                false
            }
        }
    }

    fn request_stop(&self) -> Result<(), JobError> {
        let stop = self.layout.stop_marker();
        touch_marker(&stop).map_err(|e| JobError::io(&stop, e))
    }

    /// Wait for compute tasks to exit after a stop request.
    async fn drain(&self) {
        let polls = poll_budget(self.config.drain_timeout, self.config.poll_interval);
        for attempt in 0..polls {
            match self.query().await {
                Some(state) if state.finished || state.active_tasks == 0 => return,
                Some(state) => {
                    tracing::debug!(
                        job_id = %self.record.id,
                        active = state.active_tasks,
                        "waiting for tasks to stop"
                    );
                }
                None => {}
            }
            if attempt + 1 < polls {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
        tracing::warn!(job_id = %self.record.id, "tasks still active after drain timeout");
    }

    async fn query(&self) -> Option<WorkflowState> {
        let handle = self.record.scheduler_handle.as_deref()?;
        match self.scheduler.query(handle).await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(job_id = %self.record.id, error = %e, "scheduler query failed");
                None
            }
        }
    }

    fn advance_to_running(&self) -> Result<Status, JobError> {
        let path = self.layout.status_path();
        let artifact =
            advance(&path, Status::Running, None).map_err(|e| JobError::status(&path, e))?;
        tracing::info!(job_id = %self.record.id, "job running");
        Ok(artifact.status)
    }

    /// Write a terminal status; if another writer got there first, report theirs.
    fn set_status(&self, next: Status, reason: FinishReason) -> Result<Status, JobError> {
        let path = self.layout.status_path();
        match advance(&path, next, Some(reason)) {
            Ok(artifact) => Ok(artifact.status),
            Err(StatusFileError::Transition(e)) => {
                let current = read_status(&path).map_err(|e| JobError::status(&path, e))?;
                if current.status.is_terminal() {
                    tracing::info!(job_id = %self.record.id, status = %current.status, "status already final");
                    Ok(current.status)
                } else {
                    Err(JobError::Validation(e.to_string()))
                }
            }
            Err(e) => Err(JobError::status(&path, e)),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
