// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status artifact persistence.
//!
//! `status.json` is the only mutable state shared between the operator process,
//! the monitor and external tools. Writers replace it atomically (write to a
//! `.tmp` sibling, then rename), so readers see either the old or the new
//! document. A missing file means the job is still `CREATED`.

use crate::status::{FinishReason, Status, StatusError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unreadable status artifact {path}")]
    Corrupt { path: String },
    #[error(transparent)]
    Transition(#[from] StatusError),
}

/// Contents of `status.json`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusArtifact {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FinishReason>,
}

impl StatusArtifact {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    pub fn with_reason(status: Status, reason: FinishReason) -> Self {
        Self {
            status,
            reason: Some(reason),
        }
    }
}

/// Write `bytes` to `path` through a temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, path)
}

/// Read the status artifact.
///
/// Accepts the JSON document or a bare status word (as written by shell hooks).
pub fn read_status(path: &Path) -> Result<StatusArtifact, StatusFileError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StatusArtifact::new(Status::Created));
        }
        Err(e) => return Err(e.into()),
    };

    if let Ok(artifact) = serde_json::from_str::<StatusArtifact>(&text) {
        return Ok(artifact);
    }
    text.trim()
        .parse::<Status>()
        .map(StatusArtifact::new)
        .map_err(|_| StatusFileError::Corrupt {
            path: path.display().to_string(),
        })
}

pub fn write_status(path: &Path, artifact: &StatusArtifact) -> Result<(), StatusFileError> {
    let json = serde_json::to_vec_pretty(artifact)?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Move the artifact to `next`, rejecting transitions the state machine forbids.
pub fn advance(
    path: &Path,
    next: Status,
    reason: Option<FinishReason>,
) -> Result<StatusArtifact, StatusFileError> {
    let current = read_status(path)?;
    current.status.transition(next)?;
    let updated = StatusArtifact {
        status: next,
        reason,
    };
    write_status(path, &updated)?;
    Ok(updated)
}

/// Create an empty marker file (idempotent).
pub fn touch_marker(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
}

pub fn marker_present(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
#[path = "status_file_tests.rs"]
mod tests;
