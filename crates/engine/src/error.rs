// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for job orchestration

use mc_adapters::{ProcessError, SchedulerError};
use mc_core::{JobId, PlanError, RecordError, Status, StatusFileError};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the orchestration components
#[derive(Debug, Error)]
pub enum JobError {
    /// Static or calibration data cannot be resolved
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Required input missing or malformed
    #[error("validation error: {0}")]
    Validation(String),
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scheduler error: {0}")]
    Scheduler(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {id} is not ready (status {status})")]
    NotReady { id: JobId, status: Status },
    #[error("job {id} is already {status}")]
    AlreadyTerminal { id: JobId, status: Status },
}

impl JobError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Map a status-artifact failure on `path`.
    pub fn status(path: &Path, err: StatusFileError) -> Self {
        match err {
            StatusFileError::Io(source) => JobError::io(path, source),
            StatusFileError::Transition(e) => JobError::Validation(e.to_string()),
            other => JobError::io(path, std::io::Error::other(other.to_string())),
        }
    }
}

impl From<PlanError> for JobError {
    fn from(e: PlanError) -> Self {
        JobError::Validation(e.to_string())
    }
}

impl From<RecordError> for JobError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Io { path, source } => JobError::Io { path, source },
            RecordError::Json { path, source } => JobError::Io {
                path,
                source: std::io::Error::other(source),
            },
        }
    }
}

impl From<SchedulerError> for JobError {
    fn from(e: SchedulerError) -> Self {
        JobError::Scheduler(e.to_string())
    }
}

impl From<ProcessError> for JobError {
    fn from(e: ProcessError) -> Self {
        JobError::Scheduler(e.to_string())
    }
}
