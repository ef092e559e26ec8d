// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry.
//!
//! The in-memory directory of job records. Status queries always go to the
//! workspace's status artifact; the cached value is only a convenience for
//! listing.

use crate::bundle::ResultBundle;
use crate::error::JobError;
use crate::monitor::live_monitor;
use mc_adapters::{ProcessAdapter, SchedulerAdapter};
use mc_core::status_file::{advance, read_status, touch_marker};
use mc_core::workspace::{ATTEMPT_PREFIX, RECORD_FILE};
use mc_core::{FinishReason, JobId, JobRecord, Status, WorkspaceLayout};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How a cancellation is carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelMode {
    /// Ask the monitor to stop the job at its next poll
    #[default]
    Soft,
    /// Kill the monitor and remove the workflow now
    Hard,
}

impl fmt::Display for CancelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CancelMode::Soft => "soft",
            CancelMode::Hard => "hard",
        })
    }
}

impl FromStr for CancelMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(CancelMode::Soft),
            "hard" => Ok(CancelMode::Hard),
            other => Err(JobError::Validation(format!(
                "unknown cancel mode '{}' (expected soft or hard)",
                other
            ))),
        }
    }
}

pub struct JobRegistry<S, P> {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
    scheduler: S,
    processes: P,
}

impl<S, P> JobRegistry<S, P>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    pub fn new(scheduler: S, processes: P) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            scheduler,
            processes,
        }
    }

    pub fn register(&self, id: JobId, record: JobRecord) -> Result<(), JobError> {
        if id != record.id {
            return Err(JobError::Validation(format!(
                "record {} registered under id {}",
                record.id, id
            )));
        }
        tracing::debug!(job_id = %id, "job registered");
        self.jobs.lock().insert(id, record);
        Ok(())
    }

    pub fn lookup(&self, id: &JobId) -> Result<JobRecord, JobError> {
        self.jobs
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// All records, oldest submission first
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.jobs.lock().values().cloned().collect();
        records.sort_by(|a, b| {
            a.submitted_at_ms
                .cmp(&b.submitted_at_ms)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        records
    }

    /// Current status, read from the job's status artifact.
    pub fn status(&self, id: &JobId) -> Result<Status, JobError> {
        let record = self.lookup(id)?;
        let artifact = read_status(&record.status_path)
            .map_err(|e| JobError::status(&record.status_path, e))?;
        if let Some(cached) = self.jobs.lock().get_mut(id) {
            cached.status = artifact.status;
        }
        Ok(artifact.status)
    }

    /// Cancel a job; returns the mode that was applied.
    pub async fn cancel(&self, id: &JobId, mode: CancelMode) -> Result<CancelMode, JobError> {
        let status = self.status(id)?;
        if status.is_terminal() {
            return Err(JobError::AlreadyTerminal {
                id: id.clone(),
                status,
            });
        }
        let record = self.lookup(id)?;
        match mode {
            CancelMode::Soft => {
                if record.monitor_pid.is_none() {
                    return Err(JobError::Validation(format!(
                        "job {} has no monitor to honour a soft cancel; use --mode hard",
                        id
                    )));
                }
                let layout = open_layout(&record.workspace)?;
                let marker = layout.cancel_marker();
                touch_marker(&marker).map_err(|e| JobError::io(&marker, e))?;
                tracing::info!(job_id = %id, "soft cancel requested");
            }
            CancelMode::Hard => self.hard_cancel(&record).await?,
        }
        Ok(mode)
    }

    /// Kill the monitor, then the workflow, then record CANCELLED.
    ///
    /// The recorded pid is only killed while it still holds the workspace's
    /// monitor lock; a pid left by a dead monitor may belong to anything now.
    async fn hard_cancel(&self, record: &JobRecord) -> Result<(), JobError> {
        if let Some(pid) = record.monitor_pid {
            let lock = open_layout(&record.workspace)?.monitor_lock_path();
            match live_monitor(&lock)? {
                Some(holder) if holder == pid => {
                    if let Err(e) = self.processes.kill(pid).await {
                        tracing::error!(job_id = %record.id, pid, error = %e, "failed to kill monitor");
                        return Err(e.into());
                    }
                }
                Some(holder) => {
                    tracing::warn!(job_id = %record.id, pid, holder, "monitor lock held by another pid, not killing");
                }
                None => {
                    tracing::info!(job_id = %record.id, pid, "no live monitor, nothing to kill");
                }
            }
        }
        if let Some(handle) = &record.scheduler_handle {
            if let Err(e) = self.scheduler.remove(handle).await {
                tracing::error!(job_id = %record.id, %handle, error = %e, "failed to remove workflow");
                return Err(e.into());
            }
        }

        let path = &record.status_path;
        let artifact = advance(path, Status::Cancelled, Some(FinishReason::HardCancel))
            .map_err(|e| JobError::status(path, e))?;
        if let Some(cached) = self.jobs.lock().get_mut(&record.id) {
            cached.status = artifact.status;
        }
        tracing::info!(job_id = %record.id, "job hard-cancelled");
        Ok(())
    }

    /// The job's result bundle; only available once FINISHED.
    pub fn result(&self, id: &JobId) -> Result<ResultBundle, JobError> {
        let status = self.status(id)?;
        if status != Status::Finished {
            return Err(JobError::NotReady {
                id: id.clone(),
                status,
            });
        }
        let record = self.lookup(id)?;
        let layout = open_layout(&record.workspace)?;
        ResultBundle::load_or_create(&layout, id)
    }

    /// Register every persisted record under `jobs_dir`; returns how many.
    ///
    /// Unreadable records are skipped with a warning.
    pub fn recover(&self, jobs_dir: &Path) -> Result<usize, JobError> {
        let mut recovered = 0;
        for record_path in scan_records(jobs_dir)? {
            match JobRecord::load(&record_path) {
                Ok(record) => {
                    self.jobs.lock().insert(record.id.clone(), record);
                    recovered += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %record_path.display(), error = %e, "skipping job record");
                }
            }
        }
        tracing::info!(recovered, "registry recovered");
        Ok(recovered)
    }
}

fn open_layout(workspace: &Path) -> Result<WorkspaceLayout, JobError> {
    WorkspaceLayout::open(workspace).map_err(|e| JobError::io(workspace, e))
}

/// Record files at `<jobs_dir>/<user>/<plan>/run.<N>/job.json`
fn scan_records(jobs_dir: &Path) -> Result<Vec<std::path::PathBuf>, JobError> {
    let mut found = Vec::new();
    let users = match std::fs::read_dir(jobs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(JobError::io(jobs_dir, e)),
    };
    for user in users.flatten().filter(|e| e.path().is_dir()) {
        let Ok(plans) = std::fs::read_dir(user.path()) else {
            continue;
        };
        for plan in plans.flatten().filter(|e| e.path().is_dir()) {
            let Ok(attempts) = std::fs::read_dir(plan.path()) else {
                continue;
            };
            for attempt in attempts.flatten() {
                let name = attempt.file_name();
                if !name.to_string_lossy().starts_with(ATTEMPT_PREFIX) {
                    continue;
                }
                let record = attempt.path().join(RECORD_FILE);
                if record.is_file() {
                    found.push(record);
                }
            }
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
