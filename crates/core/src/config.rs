// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System configuration.
//!
//! Loaded once at process start from TOML and passed by value (or `Arc`) into
//! every component constructor. Nothing reads configuration lazily.

use crate::id::sanitize_name;
use crate::plan::RadiationClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Key of the mandatory fallback entry in `[correction_factors]`
pub const DEFAULT_CORRECTION_KEY: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("no config file found (set MCJOB_CONFIG)")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Account the monitor and scheduler calls run as
    pub username: String,
    /// Keep per-task outputs and scratch files after a job finishes
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    /// Root under which all workspaces are allocated
    pub jobs_dir: PathBuf,
    pub commissioning_dir: PathBuf,
    /// Materials database, relative to `commissioning_dir` unless absolute
    pub materials_database: PathBuf,
    /// CT calibration directory (holds `ct-parameters.mac`)
    pub ct_dir: PathBuf,
    pub phantoms_dir: PathBuf,
    /// One subdirectory per beamline model
    pub beamlines_dir: PathBuf,
    /// Directory of helper executables (task wrapper, hooks)
    pub bindir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compute {
    pub number_of_cores: u32,
    #[serde(default = "default_proton_physics")]
    pub proton_physics_list: String,
    #[serde(default = "default_ion_physics")]
    pub ion_physics_list: String,
    #[serde(default)]
    pub next_job_start_delay_secs: u64,
}

fn default_proton_physics() -> String {
    "QGSP_BIC_HP_EMZ".to_string()
}

fn default_ion_physics() -> String {
    "Shielding_EMZ".to_string()
}

/// Per-task memory request model (MB)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryModel {
    #[serde(default = "default_base_mb")]
    pub base_mb: u64,
    /// Additional MB per million geometry voxels
    #[serde(default = "default_mb_per_mvoxel")]
    pub mb_per_mvoxel: f64,
    #[serde(default = "default_ion_surcharge_mb")]
    pub ion_surcharge_mb: u64,
}

fn default_base_mb() -> u64 {
    2000
}

fn default_mb_per_mvoxel() -> f64 {
    200.0
}

fn default_ion_surcharge_mb() -> u64 {
    1000
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self {
            base_mb: default_base_mb(),
            mb_per_mvoxel: default_mb_per_mvoxel(),
            ion_surcharge_mb: default_ion_surcharge_mb(),
        }
    }
}

impl MemoryModel {
    pub fn estimate_mb(&self, voxels: u64, class: RadiationClass) -> u64 {
        let per_voxel = (voxels as f64 / 1e6 * self.mb_per_mvoxel).ceil() as u64;
        let surcharge = match class {
            RadiationClass::Ion => self.ion_surcharge_mb,
            RadiationClass::Proton => 0,
        };
        self.base_mb + per_voxel + surcharge
    }
}

/// Calibration files for one CT scanner protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub density: PathBuf,
    pub hu_to_material: PathBuf,
    pub hu_material_db: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_monitor_binary")]
    pub binary: PathBuf,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Upper bound on waiting for tasks to stop after a STOP request
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
    /// Upper bound on waiting for the post-processing stage
    #[serde(default = "default_aggregation_timeout")]
    pub aggregation_timeout_secs: u64,
}

fn default_monitor_binary() -> PathBuf {
    PathBuf::from("mcjob-monitor")
}

fn default_poll_interval() -> u64 {
    60
}

fn default_drain_timeout() -> u64 {
    600
}

fn default_aggregation_timeout() -> u64 {
    3600
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            binary: default_monitor_binary(),
            poll_interval_secs: default_poll_interval(),
            drain_timeout_secs: default_drain_timeout(),
            aggregation_timeout_secs: default_aggregation_timeout(),
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    pub fn aggregation_timeout(&self) -> Duration {
        Duration::from_secs(self.aggregation_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Wrapper that runs one compute task, relative to `bindir` unless absolute
    #[serde(default = "default_task_executable")]
    pub task_executable: PathBuf,
    #[serde(default = "default_preprocess")]
    pub preprocess_script: PathBuf,
    #[serde(default = "default_postprocess")]
    pub postprocess_script: PathBuf,
    /// Seconds allowed for each scheduler CLI call
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_task_executable() -> PathBuf {
    PathBuf::from("run-task")
}

fn default_preprocess() -> PathBuf {
    PathBuf::from("preprocess")
}

fn default_postprocess() -> PathBuf {
    PathBuf::from("postprocess")
}

fn default_command_timeout() -> u64 {
    30
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            task_executable: default_task_executable(),
            preprocess_script: default_preprocess(),
            postprocess_script: default_postprocess(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

/// Immutable orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub identity: Identity,
    pub paths: Paths,
    pub compute: Compute,
    #[serde(default)]
    pub memory: MemoryModel,
    /// Dose correction per `<beamline>_<radiation type>` (lowercase)
    #[serde(default)]
    pub correction_factors: BTreeMap<String, f64>,
    /// CT calibrations keyed by scanner protocol
    #[serde(default)]
    pub calibrations: BTreeMap<String, Calibration>,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl SystemConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: SystemConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.username.trim().is_empty() {
            return Err(ConfigError::Invalid("identity.username is empty".into()));
        }
        if self.compute.number_of_cores == 0 {
            return Err(ConfigError::Invalid(
                "compute.number_of_cores must be >= 1".into(),
            ));
        }
        if !self.correction_factors.contains_key(DEFAULT_CORRECTION_KEY) {
            return Err(ConfigError::Invalid(format!(
                "correction_factors must define '{}'",
                DEFAULT_CORRECTION_KEY
            )));
        }
        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.poll_interval_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Dose correction for a (beamline, radiation type) pair.
    ///
    /// Returns the factor and whether the default entry was used.
    pub fn correction_factor(&self, beamline: &str, radiation_type: &str) -> (f64, bool) {
        let key = correction_key(beamline, radiation_type);
        match self.correction_factors.get(&key) {
            Some(factor) => (*factor, false),
            None => (
                self.correction_factors
                    .get(DEFAULT_CORRECTION_KEY)
                    .copied()
                    .unwrap_or(1.0),
                true,
            ),
        }
    }

    pub fn physics_list(&self, class: RadiationClass) -> &str {
        match class {
            RadiationClass::Proton => &self.compute.proton_physics_list,
            RadiationClass::Ion => &self.compute.ion_physics_list,
        }
    }

    pub fn materials_database(&self) -> PathBuf {
        resolve_under(&self.paths.commissioning_dir, &self.paths.materials_database)
    }

    /// Calibration files for `protocol`, resolved against `ct_dir`
    pub fn calibration(&self, protocol: &str) -> Option<Calibration> {
        self.calibrations.get(protocol).map(|c| Calibration {
            density: resolve_under(&self.paths.ct_dir, &c.density),
            hu_to_material: resolve_under(&self.paths.ct_dir, &c.hu_to_material),
            hu_material_db: resolve_under(&self.paths.ct_dir, &c.hu_material_db),
        })
    }

    pub fn task_executable(&self) -> PathBuf {
        resolve_under(&self.paths.bindir, &self.scheduler.task_executable)
    }

    pub fn preprocess_script(&self) -> PathBuf {
        resolve_under(&self.paths.bindir, &self.scheduler.preprocess_script)
    }

    pub fn postprocess_script(&self) -> PathBuf {
        resolve_under(&self.paths.bindir, &self.scheduler.postprocess_script)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.scheduler.command_timeout_secs)
    }
}

/// Lookup key for `[correction_factors]`
pub fn correction_key(beamline: &str, radiation_type: &str) -> String {
    sanitize_name(&format!("{}_{}", beamline.trim(), radiation_type.trim())).to_lowercase()
}

fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Config file location: `explicit` if given, else `<config dir>/mcjob/config.toml`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|d| d.join("mcjob").join("config.toml"))
        .ok_or(ConfigError::NotFound)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
