// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Removal of intermediate results once a job has finished.
//!
//! Per-task output directories and scratch files in `tmp/` go; plan and beam
//! doses, reports and the monitor's own control files stay.

use mc_core::WorkspaceLayout;
use std::fs;
use std::path::{Path, PathBuf};

/// Delete intermediate results; returns the removed paths.
///
/// Failures are logged and skipped.
pub fn prune_intermediates(layout: &WorkspaceLayout) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for path in entries(&layout.output_dir()) {
        if path.is_dir() {
            remove(&path, fs::remove_dir_all(&path), &mut removed);
        }
    }

    let keep = [
        layout.monitor_lock_path(),
        layout.stop_marker(),
        layout.aggregation_marker(),
    ];
    for path in entries(&layout.tmp_dir()) {
        if keep.contains(&path) {
            continue;
        }
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        remove(&path, result, &mut removed);
    }

    tracing::info!(job_id = %layout.job_id, removed = removed.len(), "intermediate results removed");
    removed
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot list for cleanup");
            Vec::new()
        }
    };
    paths.sort();
    paths
}

fn remove(path: &Path, result: std::io::Result<()>, removed: &mut Vec<PathBuf>) {
    match result {
        Ok(()) => removed.push(path.to_path_buf()),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "cleanup failed"),
    }
}
