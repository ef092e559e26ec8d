// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing aggregation.
//!
//! The post stage itself runs inside the workflow (the scheduler starts it once
//! every compute task is terminal). Aggregating from the monitor's side means
//! waiting for that stage and checking that it produced the plan dose.

use crate::descriptor::expected_plan_dose;
use crate::error::JobError;
use async_trait::async_trait;
use mc_adapters::SchedulerAdapter;
use mc_core::{JobRecord, WorkspaceLayout};
use std::path::PathBuf;
use std::time::Duration;

#[async_trait]
pub trait Aggregator: Send + Sync + 'static {
    /// Finalize the job's outputs. Not called again once it has succeeded.
    async fn aggregate(&self, layout: &WorkspaceLayout, record: &JobRecord) -> Result<(), JobError>;
}

/// Waits for the workflow's post stage to leave the scheduler
pub struct SchedulerAggregator<S> {
    scheduler: S,
    poll_interval: Duration,
    timeout: Duration,
}

impl<S: SchedulerAdapter> SchedulerAggregator<S> {
    pub fn new(scheduler: S, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            scheduler,
            poll_interval,
            timeout,
        }
    }
}

#[async_trait]
impl<S: SchedulerAdapter> Aggregator for SchedulerAggregator<S> {
    async fn aggregate(&self, layout: &WorkspaceLayout, record: &JobRecord) -> Result<(), JobError> {
        let handle = record.scheduler_handle.as_deref().ok_or_else(|| {
            JobError::Validation(format!("job {} has no scheduler handle", record.id))
        })?;

        let polls = poll_budget(self.timeout, self.poll_interval);
        let mut finished = false;
        for attempt in 0..polls {
            match self.scheduler.query(handle).await {
                Ok(state) if state.failed => {
                    return Err(JobError::Scheduler(format!(
                        "workflow {} failed during post-processing",
                        handle
                    )));
                }
                Ok(state) if state.finished => {
                    finished = true;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(job_id = %record.id, error = %e, "post-processing query failed");
                }
            }
            if attempt + 1 < polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        if !finished {
            return Err(JobError::Scheduler(format!(
                "post-processing of workflow {} did not finish within {}s",
                handle,
                self.timeout.as_secs()
            )));
        }

        match find_plan_dose(layout)? {
            Some(dose) => {
                tracing::info!(job_id = %record.id, dose = %dose.display(), "plan dose present");
                Ok(())
            }
            None => {
                let output = layout.output_dir();
                Err(JobError::io(
                    &output,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no plan dose produced"),
                ))
            }
        }
    }
}

/// Number of polls that fit in `timeout`, at least one
pub(crate) fn poll_budget(timeout: Duration, poll_interval: Duration) -> u64 {
    if poll_interval.is_zero() {
        return timeout.as_secs().max(1);
    }
    (timeout.as_millis() / poll_interval.as_millis()).max(1) as u64
}

/// The plan dose named in the workspace's manifest, if the post stage wrote it
pub fn find_plan_dose(layout: &WorkspaceLayout) -> Result<Option<PathBuf>, JobError> {
    let dose = layout.output_dir().join(expected_plan_dose(layout)?);
    Ok(dose.is_file().then_some(dose))
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
