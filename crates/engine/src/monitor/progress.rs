// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress sampling from per-task statistics reports.
//!
//! Every compute task keeps `output/<task>/stats.json` up to date:
//!
//! ```json
//! { "particles": 120000, "uncertainty": 3.4 }
//! ```

use serde::Deserialize;
use std::path::Path;

pub const STATS_FILE: &str = "stats.json";

#[derive(Debug, Deserialize)]
struct TaskStats {
    particles: u64,
    #[serde(default)]
    uncertainty: Option<f64>,
}

/// Progress summed over all reporting tasks
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub particles: u64,
    /// Combined relative uncertainty, `sqrt(Σ uᵢ²) / n` over reporting tasks
    pub uncertainty: Option<f64>,
    /// Tasks whose report could be read
    pub tasks: usize,
}

/// Sample the reports below `output_dir`; `None` until a task has reported.
///
/// Reports that fail to parse (a task may be mid-write) are skipped.
pub fn sample_progress(output_dir: &Path) -> Option<Progress> {
    let entries = std::fs::read_dir(output_dir).ok()?;
    let mut particles = 0u64;
    let mut tasks = 0usize;
    let mut squares = 0.0f64;
    let mut with_uncertainty = 0usize;

    for entry in entries.flatten() {
        let path = entry.path().join(STATS_FILE);
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let stats: TaskStats = match serde_json::from_str(&text) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping task report");
                continue;
            }
        };
        tasks += 1;
        particles = particles.saturating_add(stats.particles);
        if let Some(u) = stats.uncertainty {
            squares += u * u;
            with_uncertainty += 1;
        }
    }

    if tasks == 0 {
        return None;
    }
    let uncertainty = (with_uncertainty > 0).then(|| squares.sqrt() / with_uncertainty as f64);
    Some(Progress {
        particles,
        uncertainty,
        tasks,
    })
}
