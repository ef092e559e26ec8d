// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted job record (`job.json`)

use crate::id::{JobId, PlanId};
use crate::plan::StoppingCriteria;
use crate::status::Status;
use crate::status_file::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid job record {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Registry entry for one job attempt.
///
/// `status` is the last value the registry observed; the status artifact at
/// `status_path` stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub user: String,
    pub plan: PlanId,
    pub workspace: PathBuf,
    pub status_path: PathBuf,
    pub status: Status,
    /// Scheduler cluster handle, set once submission succeeded
    #[serde(default)]
    pub scheduler_handle: Option<String>,
    #[serde(default)]
    pub submitted_at_ms: u64,
    /// Pid of the monitor bound to this workspace
    #[serde(default)]
    pub monitor_pid: Option<u32>,
    pub stopping: StoppingCriteria,
}

impl JobRecord {
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RecordError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| RecordError::Json {
            path: path.display().to_string(),
            source,
        })?;
        write_atomic(path, &json).map_err(|source| RecordError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
