// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result bundle: the final plan dose and report of a finished job.
//!
//! Stored as zstd-compressed JSON in `output/result.bundle`. The bundle is
//! built once and served from disk afterwards, so repeated retrievals return
//! identical bytes.

use crate::descriptor::expected_plan_dose;
use crate::error::JobError;
use chrono::{DateTime, Utc};
use mc_core::{JobId, WorkspaceLayout};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub name: String,
    /// Lowercase hex SHA-256 of `data`
    pub sha256: String,
    pub size: u64,
    pub data: Vec<u8>,
}

impl BundleEntry {
    fn new(name: String, data: Vec<u8>) -> Self {
        Self {
            sha256: digest(&data),
            size: data.len() as u64,
            name,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
    /// Sorted by name
    pub entries: Vec<BundleEntry>,
}

fn digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// The plan dose plus every report file
fn is_bundled(name: &str, plan_dose: &str) -> bool {
    name == plan_dose || name.ends_with(".cfg")
}

impl ResultBundle {
    /// Gather the plan dose and report files from `output/`.
    pub fn collect(layout: &WorkspaceLayout, job_id: &JobId) -> Result<Self, JobError> {
        let output = layout.output_dir();
        let plan_dose = expected_plan_dose(layout)?;
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&output)
            .map_err(|e| JobError::io(&output, e))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| is_bundled(n, &plan_dose))
            })
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let data = std::fs::read(&path).map_err(|e| JobError::io(&path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(BundleEntry::new(name, data));
        }
        if !entries.iter().any(|e| e.name == plan_dose) {
            return Err(JobError::io(
                &output,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no plan dose to bundle"),
            ));
        }

        Ok(Self {
            job_id: job_id.clone(),
            created_at: Utc::now(),
            entries,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, JobError> {
        let json =
            serde_json::to_vec(self).map_err(|e| JobError::Validation(e.to_string()))?;
        zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| JobError::Validation(format!("bundle compression failed: {}", e)))
    }

    /// Decode and verify every entry's checksum.
    pub fn decode(bytes: &[u8]) -> Result<Self, JobError> {
        let json = zstd::decode_all(bytes)
            .map_err(|e| JobError::Validation(format!("bundle is not zstd data: {}", e)))?;
        let bundle: ResultBundle = serde_json::from_slice(&json)
            .map_err(|e| JobError::Validation(format!("bundle is malformed: {}", e)))?;
        for entry in &bundle.entries {
            if entry.size != entry.data.len() as u64 || digest(&entry.data) != entry.sha256 {
                return Err(JobError::Validation(format!(
                    "bundle entry {} fails its checksum",
                    entry.name
                )));
            }
        }
        Ok(bundle)
    }

    /// Serve the stored bundle, building it on first use.
    ///
    /// The first writer to publish `output/result.bundle` wins; every caller
    /// returns what is on disk afterwards.
    pub fn load_or_create(layout: &WorkspaceLayout, job_id: &JobId) -> Result<Self, JobError> {
        let path = layout.bundle_path();
        if let Some(bytes) = read_if_present(&path)? {
            return Self::decode(&bytes);
        }

        let bundle = Self::collect(layout, job_id)?;
        if publish(&path, &bundle.encode()?)? {
            tracing::info!(
                job_id = %job_id,
                entries = bundle.entries.len(),
                "result bundle written"
            );
        }
        let bytes = std::fs::read(&path).map_err(|e| JobError::io(&path, e))?;
        Self::decode(&bytes)
    }

    pub fn entry(&self, name: &str) -> Option<&BundleEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Extract every entry into `dir`; returns the written paths.
    pub fn extract(&self, dir: &Path) -> Result<Vec<PathBuf>, JobError> {
        std::fs::create_dir_all(dir).map_err(|e| JobError::io(dir, e))?;
        let mut written = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.name.contains(['/', '\\']) || entry.name.starts_with('.') {
                return Err(JobError::Validation(format!(
                    "refusing to extract bundle entry {:?}",
                    entry.name
                )));
            }
            let path = dir.join(&entry.name);
            std::fs::write(&path, &entry.data).map_err(|e| JobError::io(&path, e))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn read_if_present(path: &Path) -> Result<Option<Vec<u8>>, JobError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(JobError::io(path, e)),
    }
}

/// Write `bytes` to a private temp file and link it into place unless `path`
/// already exists. Returns whether this call published the file.
fn publish(path: &Path, bytes: &[u8]) -> Result<bool, JobError> {
    static SEQ: AtomicU64 = AtomicU64::new(0);

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = PathBuf::from(tmp_name);

    let written = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(JobError::io(&tmp, e));
    }

    let linked = std::fs::hard_link(&tmp, path);
    let _ = std::fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(JobError::io(path, e)),
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
