// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-beam compute job specification

use crate::id::BeamId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the scheduler needs to run the compute tasks of one beam.
///
/// Built once by the job-graph compiler and never mutated afterwards.
/// Artifact paths are relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub beam_id: BeamId,
    pub beam_number: u32,
    pub beam_name: String,
    /// `beam_name` restricted to `[A-Za-z0-9_]`
    pub sanitized_name: String,
    pub radiation_type: String,
    pub beamline: String,
    /// Generated configuration artifact (`mac/...mac`)
    pub config_artifact: PathBuf,
    /// Beam dose output (`output/...-dose.mhd`)
    pub output_artifact: PathBuf,
    /// Number of parallel tasks queued for this beam
    pub job_count: u32,
    pub memory_mb: u64,
    pub dose_correction: f64,
    /// Whether `dose_correction` came from the default fallback entry
    #[serde(default)]
    pub correction_is_default: bool,
    /// `"x y z"` in the geometry's frame
    pub isocenter: String,
    #[serde(default)]
    pub dose_to_water: bool,
}

impl JobSpec {
    /// Stem shared by this beam's artifacts (`<label>-beam<N>-<name>`)
    pub fn artifact_stem(&self) -> String {
        self.config_artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Encode an isocenter as three space-separated coordinates.
pub fn encode_isocenter(isocenter: [f64; 3]) -> String {
    format!("{} {} {}", isocenter[0], isocenter[1], isocenter[2])
}
