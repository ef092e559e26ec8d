// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTCondor scheduler adapter (DAGMan workflows)

use super::{SchedulerAdapter, SchedulerError, SubmitOutput, WorkflowState};
use crate::subprocess::{exit_code, run_with_timeout, stderr_text, stdout_text, SCHEDULER_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

// HTCondor JobStatus codes
const IDLE: u32 = 1;
const RUNNING: u32 = 2;
const REMOVED: u32 = 3;
const COMPLETED: u32 = 4;

/// Scheduler adapter driving the HTCondor command-line tools
#[derive(Clone, Debug)]
pub struct CondorScheduler {
    bin_dir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for CondorScheduler {
    fn default() -> Self {
        Self {
            bin_dir: crate::env::condor_bin_dir(),
            timeout: SCHEDULER_TIMEOUT,
        }
    }
}

impl CondorScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    fn command(&self, tool: &str) -> Command {
        match &self.bin_dir {
            Some(dir) => Command::new(dir.join(tool)),
            None => Command::new(tool),
        }
    }

    async fn run(&self, cmd: Command, tool: &str) -> Result<std::process::Output, SchedulerError> {
        run_with_timeout(cmd, self.timeout, tool)
            .await
            .map_err(SchedulerError::CommandFailed)
    }
}

#[async_trait]
impl SchedulerAdapter for CondorScheduler {
    async fn submit(&self, workflow: &Path, workdir: &Path) -> Result<SubmitOutput, SchedulerError> {
        let mut cmd = self.command("condor_submit_dag");
        cmd.arg("-batch").arg("-force").arg(workflow).current_dir(workdir);
        let output = self.run(cmd, "condor_submit_dag").await?;

        let code = exit_code(&output);
        let handle = if code == 0 {
            Some(parse_cluster_id(&stdout_text(&output)).ok_or_else(|| {
                SchedulerError::Parse(format!(
                    "no cluster id in condor_submit_dag output: {}",
                    stdout_text(&output)
                ))
            })?)
        } else {
            None
        };
        Ok(SubmitOutput {
            exit_code: code,
            handle,
            message: stderr_text(&output),
        })
    }

    async fn query(&self, handle: &str) -> Result<WorkflowState, SchedulerError> {
        let constraint = format!("ClusterId == {0} || DAGManJobId == {0}", handle);
        let mut cmd = self.command("condor_q");
        cmd.args(["-constraint", &constraint, "-af", "ClusterId", "JobStatus"]);
        let output = self.run(cmd, "condor_q").await?;
        if exit_code(&output) != 0 {
            return Err(SchedulerError::CommandFailed(stderr_text(&output)));
        }

        let (dag_queued, active_tasks) = parse_queue(&stdout_text(&output), handle)?;
        if dag_queued {
            return Ok(WorkflowState::active(active_tasks));
        }

        let mut cmd = self.command("condor_history");
        cmd.args([handle, "-limit", "1", "-af", "JobStatus", "ExitCode"]);
        let output = self.run(cmd, "condor_history").await?;
        parse_history(&stdout_text(&output))?
            .ok_or_else(|| SchedulerError::UnknownHandle(handle.to_string()))
    }

    async fn remove(&self, handle: &str) -> Result<(), SchedulerError> {
        let mut cmd = self.command("condor_rm");
        cmd.arg(handle);
        let output = self.run(cmd, "condor_rm").await?;
        if exit_code(&output) != 0 {
            return Err(SchedulerError::CommandFailed(format!(
                "condor_rm {}: {}",
                handle,
                stderr_text(&output)
            )));
        }
        Ok(())
    }
}

/// Extract the cluster id from `... submitted to cluster 4711.`
pub(crate) fn parse_cluster_id(stdout: &str) -> Option<String> {
    let (_, rest) = stdout.rsplit_once("submitted to cluster")?;
    let id: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!id.is_empty()).then_some(id)
}

/// Parse `ClusterId JobStatus` lines: (workflow still queued, active task count).
pub(crate) fn parse_queue(stdout: &str, handle: &str) -> Result<(bool, u32), SchedulerError> {
    let mut dag_queued = false;
    let mut active = 0;
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.split_whitespace();
        let (Some(cluster), Some(status)) = (fields.next(), fields.next()) else {
            return Err(SchedulerError::Parse(line.to_string()));
        };
        let status: u32 = status
            .parse()
            .map_err(|_| SchedulerError::Parse(line.to_string()))?;
        if cluster == handle {
            dag_queued = true;
        } else if status == IDLE || status == RUNNING {
            active += 1;
        }
    }
    Ok((dag_queued, active))
}

/// Parse `JobStatus ExitCode` of a workflow that left the queue.
pub(crate) fn parse_history(stdout: &str) -> Result<Option<WorkflowState>, SchedulerError> {
    let Some(line) = stdout.lines().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let mut fields = line.split_whitespace();
    let status: u32 = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| SchedulerError::Parse(line.to_string()))?;
    let exit = fields.next().and_then(|s| s.parse::<i64>().ok());

    let state = match (status, exit) {
        (COMPLETED, Some(0)) | (COMPLETED, None) => WorkflowState::completed(),
        (COMPLETED, Some(_)) | (REMOVED, _) => WorkflowState::failed(),
        _ => return Err(SchedulerError::Parse(line.to_string())),
    };
    Ok(Some(state))
}

#[cfg(test)]
#[path = "condor_tests.rs"]
mod tests;
