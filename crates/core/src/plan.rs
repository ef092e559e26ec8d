// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Treatment plan details as handed to the orchestrator.
//!
//! Plans arrive already extracted from DICOM by an external front end; here
//! they are plain serde data that can be read from TOML or JSON.

use crate::id::{BeamId, PlanId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating a plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("plan has no beams")]
    NoBeams,
    #[error("duplicate beam id: {0}")]
    DuplicateBeam(BeamId),
    #[error("override given for unknown beam: {0}")]
    UnknownOverrideBeam(BeamId),
    #[error("no stopping criteria: set min_particles or uncertainty_goal")]
    NoStoppingCriteria,
    #[error("{field} contains a line break or control character: {value:?}")]
    ControlCharacter { field: &'static str, value: String },
}

/// Physics configuration family of a radiation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiationClass {
    Proton,
    Ion,
}

impl RadiationClass {
    /// Classify a DICOM radiation type string (`PROTON`, `ION ...`).
    pub fn of(radiation_type: &str) -> Option<Self> {
        let upper = radiation_type.trim().to_ascii_uppercase();
        if upper == "PROTON" {
            Some(RadiationClass::Proton)
        } else if upper.starts_with("ION") {
            Some(RadiationClass::Ion)
        } else {
            None
        }
    }
}

/// One irradiation field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub id: BeamId,
    pub number: u32,
    pub name: String,
    pub radiation_type: String,
    /// Treatment machine (beamline) the beam was planned for
    pub treatment_machine: String,
    #[serde(default)]
    pub range_shifters: Vec<String>,
    #[serde(default)]
    pub range_modulators: Vec<String>,
    pub isocenter: [f64; 3],
    #[serde(default)]
    pub gantry_angle: f64,
    #[serde(default)]
    pub patient_angle: f64,
    #[serde(default = "default_selected")]
    pub selected: bool,
}

fn default_selected() -> bool {
    true
}

/// Fixed phantom used instead of the patient image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhantomSpec {
    pub label: String,
    #[serde(default)]
    pub dose_to_water: bool,
    /// Isocenter per beam in phantom coordinates (mm)
    #[serde(default)]
    pub isocenters: BTreeMap<BeamId, [f64; 3]>,
}

/// How the patient geometry is modelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GeometryMode {
    /// Voxelized CT image; requires calibration for the scanner protocol
    Volumetric {
        ct_protocol: String,
        voxel_count: u64,
    },
    /// Fixed phantom geometry from the phantom collection
    Phantom(PhantomSpec),
}

impl GeometryMode {
    pub fn is_volumetric(&self) -> bool {
        matches!(self, GeometryMode::Volumetric { .. })
    }

    /// Whether the workflow needs an image-preparation stage
    pub fn needs_image_preparation(&self) -> bool {
        self.is_volumetric()
    }
}

impl fmt::Display for GeometryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryMode::Volumetric { ct_protocol, .. } => write!(f, "CT ({})", ct_protocol),
            GeometryMode::Phantom(p) => write!(f, "PHANTOM ({})", p.label),
        }
    }
}

/// Thresholds that end a simulation run. Zero disables a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoppingCriteria {
    #[serde(default)]
    pub min_particles: u64,
    /// Relative statistical uncertainty goal in percent
    #[serde(default)]
    pub uncertainty_goal: f64,
    /// Wall-time limit per compute task, in seconds
    #[serde(default)]
    pub timeout_secs: u64,
}

impl StoppingCriteria {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// At least one statistical goal must be set; a bare timeout is not enough.
    pub fn has_statistical_goal(&self) -> bool {
        self.min_particles > 0 || self.uncertainty_goal > 0.0
    }
}

/// User replacement for a beam's planned range shifters/modulators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamOverride {
    #[serde(default)]
    pub range_shifters: Option<Vec<String>>,
    #[serde(default)]
    pub range_modulators: Option<Vec<String>>,
}

/// A validated treatment plan plus user wishes for this calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDetails {
    pub uid: PlanId,
    pub user: String,
    pub beamset_name: String,
    pub beams: Vec<Beam>,
    pub geometry: GeometryMode,
    pub stopping: StoppingCriteria,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub overrides: BTreeMap<BeamId, BeamOverride>,
    /// Simulate every beam with this beamline model instead of its treatment machine
    #[serde(default)]
    pub beamline_override: Option<String>,
    /// Number of parallel tasks per beam (0 = configured default)
    #[serde(default)]
    pub cores: u32,
    /// Memory per task in MB (overrides the configured formula)
    #[serde(default)]
    pub memory_mb: Option<u64>,
    /// Dose grid voxel count (phantom geometry memory estimate)
    #[serde(default)]
    pub dose_voxels: u64,
}

impl PlanDetails {
    /// Load a plan from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let plan = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            _ => Self::from_toml_str(&text)?,
        };
        Ok(plan)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject plans that must not produce a job.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.uid.as_str().trim().is_empty() {
            return Err(PlanError::MissingField("uid"));
        }
        if self.user.trim().is_empty() {
            return Err(PlanError::MissingField("user"));
        }
        if self.beams.is_empty() {
            return Err(PlanError::NoBeams);
        }
        if !self.stopping.has_statistical_goal() {
            return Err(PlanError::NoStoppingCriteria);
        }
        self.check_text()?;

        let mut seen = HashSet::new();
        for beam in &self.beams {
            if !seen.insert(&beam.id) {
                return Err(PlanError::DuplicateBeam(beam.id.clone()));
            }
        }
        if let Some(unknown) = self.overrides.keys().find(|id| !seen.contains(id)) {
            return Err(PlanError::UnknownOverrideBeam(unknown.clone()));
        }
        Ok(())
    }

    /// Reject control characters in every free-text field.
    ///
    /// These values end up inside generated macros and descriptors, where a
    /// line break would start a new command.
    pub fn check_text(&self) -> Result<(), PlanError> {
        plain_text("uid", self.uid.as_str())?;
        plain_text("user", &self.user)?;
        plain_text("beamset_name", &self.beamset_name)?;
        if let Some(beamline) = &self.beamline_override {
            plain_text("beamline_override", beamline)?;
        }
        match &self.geometry {
            GeometryMode::Volumetric { ct_protocol, .. } => plain_text("ct_protocol", ct_protocol)?,
            GeometryMode::Phantom(p) => plain_text("phantom label", &p.label)?,
        }
        for beam in &self.beams {
            plain_text("beam id", beam.id.as_str())?;
            plain_text("beam name", &beam.name)?;
            plain_text("radiation_type", &beam.radiation_type)?;
            plain_text("treatment_machine", &beam.treatment_machine)?;
            for device in beam.range_shifters.iter().chain(&beam.range_modulators) {
                plain_text("range device", device)?;
            }
        }
        for ov in self.overrides.values() {
            let shifters = ov.range_shifters.iter().flatten();
            let modulators = ov.range_modulators.iter().flatten();
            for device in shifters.chain(modulators) {
                plain_text("range device override", device)?;
            }
        }
        Ok(())
    }

    pub fn beam(&self, id: &BeamId) -> Option<&Beam> {
        self.beams.iter().find(|b| &b.id == id)
    }

    /// Beamline model name to use for `beam`
    pub fn beamline_for<'a>(&'a self, beam: &'a Beam) -> &'a str {
        self.beamline_override
            .as_deref()
            .unwrap_or(&beam.treatment_machine)
    }

    /// Number of voxels driving the memory estimate
    pub fn geometry_voxels(&self) -> u64 {
        match &self.geometry {
            GeometryMode::Volumetric { voxel_count, .. } => *voxel_count,
            GeometryMode::Phantom(_) => self.dose_voxels,
        }
    }
}

fn plain_text(field: &'static str, value: &str) -> Result<(), PlanError> {
    if value.chars().any(char::is_control) {
        return Err(PlanError::ControlCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
