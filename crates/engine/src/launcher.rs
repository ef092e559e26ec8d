// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow submission and monitor start-up

use crate::error::JobError;
use mc_adapters::{MonitorInvocation, ProcessAdapter, SchedulerAdapter};
use mc_core::status_file::advance;
use mc_core::{Clock, JobRecord, PlanDetails, Status, SystemConfig, WorkspaceLayout};
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub record: JobRecord,
    pub exit_code: i32,
    pub handle: String,
    /// Non-fatal problems worth showing to the operator
    pub notes: Vec<String>,
}

pub struct Launcher<S, P, C> {
    scheduler: S,
    processes: P,
    clock: C,
    config: Arc<SystemConfig>,
    config_path: Option<PathBuf>,
}

impl<S, P, C> Launcher<S, P, C>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(scheduler: S, processes: P, clock: C, config: Arc<SystemConfig>) -> Self {
        Self {
            scheduler,
            processes,
            clock,
            config,
            config_path: None,
        }
    }

    /// Config file the monitor should load (forwarded as `-c`)
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Enqueue the workspace's workflow, then start its monitor.
    ///
    /// A rejected submission is not retried. A monitor that fails to start
    /// leaves the job SUBMITTED with no monitor pid.
    pub async fn submit(
        &self,
        layout: &WorkspaceLayout,
        plan: &PlanDetails,
    ) -> Result<Submission, JobError> {
        let workflow = layout.workflow_descriptor_path();
        if !workflow.is_file() {
            return Err(JobError::Validation(format!(
                "workflow descriptor missing: {}",
                workflow.display()
            )));
        }

        let output = self.scheduler.submit(&workflow, &layout.root).await?;
        let handle = match (&output.handle, output.succeeded()) {
            (Some(handle), true) => handle.clone(),
            _ => {
                tracing::error!(
                    job_id = %layout.job_id,
                    exit_code = output.exit_code,
                    message = %output.message,
                    "workflow submission rejected"
                );
                return Err(JobError::Scheduler(format!(
                    "submission exited with code {}: {}",
                    output.exit_code,
                    output.message.trim()
                )));
            }
        };

        let status_path = layout.status_path();
        advance(&status_path, Status::Submitted, None)
            .map_err(|e| JobError::status(&status_path, e))?;

        let mut record = JobRecord {
            id: layout.job_id.clone(),
            user: plan.user.clone(),
            plan: plan.uid.clone(),
            workspace: layout.root.clone(),
            status_path,
            status: Status::Submitted,
            scheduler_handle: Some(handle.clone()),
            submitted_at_ms: self.clock.epoch_ms(),
            monitor_pid: None,
            stopping: plan.stopping,
        };
        record.save(&layout.record_path())?;
        tracing::info!(job_id = %record.id, %handle, "workflow submitted");

        let mut notes = Vec::new();
        let invocation = MonitorInvocation {
            binary: self.config.monitor.binary.clone(),
            user: self.config.identity.username.clone(),
            timeout_secs: plan.stopping.timeout_secs,
            min_particles: plan.stopping.min_particles,
            uncertainty_goal: plan.stopping.uncertainty_goal,
            poll_interval_secs: self.config.monitor.poll_interval_secs,
            workspace: layout.root.clone(),
            daemon: true,
            config: self.config_path.clone(),
        };
        match self.processes.spawn_monitor(&invocation).await {
            Ok(pid) => {
                record.monitor_pid = Some(pid);
                record.save(&layout.record_path())?;
            }
            Err(e) => {
                tracing::warn!(job_id = %record.id, error = %e, "monitor did not start");
                notes.push(format!("monitor did not start: {}", e));
            }
        }

        Ok(Submission {
            record,
            exit_code: output.exit_code,
            handle,
            notes,
        })
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
