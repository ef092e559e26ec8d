// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace layout: the per-attempt directory tree and its well-known files.
//!
//! ```text
//! <jobs_dir>/<user>/<plan>/run.<N>/
//!     output/  mac/  data/  logs/  tmp/
//!     status.json  job.json  cancel.request
//!     submit.sub  workflow.dag  postprocess.json
//! ```

use crate::id::{sanitize_name, JobId, PlanId};
use std::io;
use std::path::{Path, PathBuf};

/// Fixed subdirectories of every workspace
pub const SUBDIRS: [&str; 5] = ["output", "mac", "data", "logs", "tmp"];

/// Prefix of attempt directory names (`run.<N>`)
pub const ATTEMPT_PREFIX: &str = "run.";

/// Suffix appended to attempts whose construction failed
pub const FAILED_SUFFIX: &str = ".failed";

/// Persisted job record inside each workspace
pub const RECORD_FILE: &str = "job.json";

/// Directory holding all attempts for one `(user, plan)` pair
pub fn attempts_dir(jobs_dir: &Path, user: &str, plan: &PlanId) -> PathBuf {
    jobs_dir
        .join(sanitize_name(user))
        .join(sanitize_name(plan.as_str()))
}

/// Parse the attempt index from `run.<N>` or `run.<N>.failed`.
pub fn parse_attempt_index(dir_name: &str) -> Option<u32> {
    let rest = dir_name.strip_prefix(ATTEMPT_PREFIX)?;
    let digits = rest.strip_suffix(FAILED_SUFFIX).unwrap_or(rest);
    digits.parse().ok()
}

/// Paths of one job attempt's workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
    pub index: u32,
    pub job_id: JobId,
}

impl WorkspaceLayout {
    pub fn new(root: PathBuf, index: u32, job_id: JobId) -> Self {
        Self {
            root,
            index,
            job_id,
        }
    }

    /// Rebuild the layout of an existing workspace from its path.
    ///
    /// The job id is derived from the `<user>/<plan>/run.<N>` components.
    pub fn open(root: &Path) -> io::Result<Self> {
        let invalid = |msg: &str| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: {}", msg, root.display()),
            )
        };

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("workspace path has no directory name"))?;
        if name.ends_with(FAILED_SUFFIX) {
            return Err(invalid("workspace construction failed"));
        }
        let index = parse_attempt_index(name).ok_or_else(|| invalid("not a workspace"))?;

        let plan_dir = root.parent().ok_or_else(|| invalid("missing plan directory"))?;
        let plan = plan_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("missing plan directory"))?;
        let user = plan_dir
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("missing user directory"))?;

        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("workspace does not exist: {}", root.display()),
            ));
        }

        Ok(Self::new(
            root.to_path_buf(),
            index,
            JobId::for_attempt(user, &PlanId::new(plan), index),
        ))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn mac_dir(&self) -> PathBuf {
        self.root.join("mac")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Shared status artifact (the cross-process source of truth)
    pub fn status_path(&self) -> PathBuf {
        self.root.join("status.json")
    }

    /// Persisted job record
    pub fn record_path(&self) -> PathBuf {
        self.root.join(RECORD_FILE)
    }

    /// Soft-cancel request, consumed by the monitor
    pub fn cancel_marker(&self) -> PathBuf {
        self.root.join("cancel.request")
    }

    /// Graceful-stop request polled by the compute tasks
    pub fn stop_marker(&self) -> PathBuf {
        self.tmp_dir().join("STOP")
    }

    pub fn submit_descriptor_path(&self) -> PathBuf {
        self.root.join("submit.sub")
    }

    pub fn workflow_descriptor_path(&self) -> PathBuf {
        self.root.join("workflow.dag")
    }

    pub fn postprocess_manifest_path(&self) -> PathBuf {
        self.root.join("postprocess.json")
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.output_dir().join("result.bundle")
    }

    /// Exclusive lock held by the running monitor
    pub fn monitor_lock_path(&self) -> PathBuf {
        self.tmp_dir().join("monitor.lock")
    }

    pub fn monitor_log_path(&self) -> PathBuf {
        self.logs_dir().join("monitor.log")
    }

    /// Written once post-processing aggregation has been triggered
    pub fn aggregation_marker(&self) -> PathBuf {
        self.tmp_dir().join("aggregation.done")
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
