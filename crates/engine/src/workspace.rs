// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace construction.
//!
//! Every job attempt gets its own `run.<N>` directory. Indices are claimed with
//! an exclusive `create_dir`, so concurrent builders for the same user and plan
//! never share one. A directory whose population fails is renamed to
//! `run.<N>.failed`; the index stays consumed.

use crate::error::JobError;
use crate::fsutil::{copy_file, copy_into, copy_tree, write_file};
use mc_core::config::Calibration;
use mc_core::workspace::{attempts_dir, parse_attempt_index, ATTEMPT_PREFIX, FAILED_SUFFIX, SUBDIRS};
use mc_core::{GeometryMode, JobId, PlanDetails, SystemConfig, WorkspaceLayout};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Attempts at claiming an index before giving up
const MAX_CLAIM_ATTEMPTS: u32 = 64;

/// Geometry inputs resolved before any directory is claimed
enum GeometrySource {
    Volumetric {
        protocol: String,
        voxel_count: u64,
        calibration: Calibration,
    },
    Phantom {
        label: String,
    },
}

/// Image-preparation inputs consumed by the pre-processing hook
#[derive(Serialize)]
struct PreprocessConfig<'a> {
    protocol: &'a str,
    voxel_count: u64,
    density: String,
    hu_to_material: String,
    hu_material_db: String,
}

pub struct WorkspaceBuilder {
    config: Arc<SystemConfig>,
}

impl WorkspaceBuilder {
    pub fn new(config: Arc<SystemConfig>) -> Self {
        Self { config }
    }

    /// Allocate and populate a fresh workspace for `plan`.
    pub fn create(&self, plan: &PlanDetails) -> Result<WorkspaceLayout, JobError> {
        let geometry = self.resolve_geometry(&plan.geometry)?;

        let parent = attempts_dir(&self.config.paths.jobs_dir, &plan.user, &plan.uid);
        let (root, index) = claim_next(&parent)?;
        let layout = WorkspaceLayout::new(
            root.clone(),
            index,
            JobId::for_attempt(&plan.user, &plan.uid, index),
        );

        if let Err(e) = self.populate(&layout, &geometry) {
            let failed = failed_path(&root);
            if let Err(rename_err) = fs::rename(&root, &failed) {
                tracing::error!(
                    workspace = %root.display(),
                    error = %rename_err,
                    "failed to retire broken workspace"
                );
            }
            tracing::warn!(job_id = %layout.job_id, error = %e, "workspace construction failed");
            return Err(e);
        }

        tracing::info!(
            job_id = %layout.job_id,
            workspace = %layout.root.display(),
            "workspace created"
        );
        Ok(layout)
    }

    fn resolve_geometry(&self, geometry: &GeometryMode) -> Result<GeometrySource, JobError> {
        match geometry {
            GeometryMode::Volumetric {
                ct_protocol,
                voxel_count,
            } => {
                let calibration = self.config.calibration(ct_protocol).ok_or_else(|| {
                    JobError::Configuration(format!(
                        "no CT calibration for protocol '{}'",
                        ct_protocol
                    ))
                })?;
                Ok(GeometrySource::Volumetric {
                    protocol: ct_protocol.clone(),
                    voxel_count: *voxel_count,
                    calibration,
                })
            }
            GeometryMode::Phantom(spec) => {
                if !phantom_exists(&self.config.paths.phantoms_dir, &spec.label) {
                    return Err(JobError::Configuration(format!(
                        "phantom '{}' not found in {}",
                        spec.label,
                        self.config.paths.phantoms_dir.display()
                    )));
                }
                Ok(GeometrySource::Phantom {
                    label: spec.label.clone(),
                })
            }
        }
    }

    fn populate(&self, layout: &WorkspaceLayout, geometry: &GeometrySource) -> Result<(), JobError> {
        for sub in SUBDIRS {
            let dir = layout.root.join(sub);
            fs::create_dir_all(&dir).map_err(|e| JobError::io(&dir, e))?;
        }
        make_world_writable(&layout.tmp_dir())?;

        copy_into(&self.config.materials_database(), &layout.data_dir())?;

        match geometry {
            GeometrySource::Volumetric {
                protocol,
                voxel_count,
                calibration,
            } => {
                let ct_dir = layout.data_dir().join("CT");
                copy_file(
                    &self.config.paths.ct_dir.join("ct-parameters.mac"),
                    &ct_dir.join("ct-parameters.mac"),
                )?;
                let density = copy_into(&calibration.density, &ct_dir)?;
                let hu_to_material = copy_into(&calibration.hu_to_material, &ct_dir)?;
                let hu_material_db = copy_into(&calibration.hu_material_db, &ct_dir)?;

                let preprocess = PreprocessConfig {
                    protocol,
                    voxel_count: *voxel_count,
                    density: relative(&layout.root, &density),
                    hu_to_material: relative(&layout.root, &hu_to_material),
                    hu_material_db: relative(&layout.root, &hu_material_db),
                };
                let json = serde_json::to_vec_pretty(&preprocess)
                    .map_err(|e| JobError::Validation(e.to_string()))?;
                write_file(&ct_dir.join("preprocess.json"), &json)?;
            }
            GeometrySource::Phantom { label } => {
                copy_tree(&self.config.paths.phantoms_dir, &layout.data_dir().join("phantoms"))?;
                tracing::debug!(job_id = %layout.job_id, phantom = %label, "phantoms copied");
            }
        }
        Ok(())
    }
}

/// Claim the next unused `run.<N>` under `parent`.
fn claim_next(parent: &Path) -> Result<(PathBuf, u32), JobError> {
    fs::create_dir_all(parent).map_err(|e| JobError::io(parent, e))?;
    for _ in 0..MAX_CLAIM_ATTEMPTS {
        let index = next_index(parent)?;
        let root = parent.join(format!("{}{}", ATTEMPT_PREFIX, index));
        match fs::create_dir(&root) {
            Ok(()) => return Ok((root, index)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(JobError::io(&root, e)),
        }
    }
    Err(JobError::io(
        parent,
        std::io::Error::other("could not claim a workspace index"),
    ))
}

/// `max(existing) + 1`, counting failed attempts
pub fn next_index(parent: &Path) -> Result<u32, JobError> {
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(JobError::io(parent, e)),
    };
    let max = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().and_then(parse_attempt_index))
        .max();
    Ok(max.map_or(1, |m| m + 1))
}

fn failed_path(root: &Path) -> PathBuf {
    let mut name = root.as_os_str().to_os_string();
    name.push(FAILED_SUFFIX);
    PathBuf::from(name)
}

fn phantom_exists(phantoms_dir: &Path, label: &str) -> bool {
    if phantoms_dir.join(label).exists() {
        return true;
    }
    fs::read_dir(phantoms_dir)
        .map(|entries| {
            entries.flatten().any(|entry| {
                entry
                    .path()
                    .file_stem()
                    .is_some_and(|stem| stem.to_string_lossy() == label)
            })
        })
        .unwrap_or(false)
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(unix)]
fn make_world_writable(dir: &Path) -> Result<(), JobError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o777)).map_err(|e| JobError::io(dir, e))
}

#[cfg(not(unix))]
fn make_world_writable(_dir: &Path) -> Result<(), JobError> {
    Ok(())
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
