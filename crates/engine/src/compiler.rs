// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-graph compilation: plan + workspace → one [`JobSpec`] per simulated beam.
//!
//! Beams are handled in plan order:
//!
//! 1. deselected beams are skipped;
//! 2. the radiation type selects the physics list (unknown type is fatal);
//! 3. a beamline model without data for the radiation type skips the beam;
//! 4. range shifters/modulators come from the user override or the plan;
//! 5. the dose correction comes from `(beamline, radiation type)` or the default;
//! 6. a uniquely named configuration artifact is written to `mac/`.
//!
//! Every decision is recorded in the [`CompileSummary`].

use crate::beamline::{BeamlineCatalog, BeamlineModel};
use crate::error::JobError;
use crate::fsutil::{copy_any_into, copy_file, write_file};
use indexmap::IndexMap;
use mc_core::job_spec::encode_isocenter;
use mc_core::{
    sanitize_name, Beam, BeamId, GeometryMode, JobSpec, PlanDetails, RadiationClass, SystemConfig,
    WorkspaceLayout,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a beam produced no job
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Deselected,
    /// The beamline model has no data for this radiation type
    MissingRadiationData {
        beamline: String,
        radiation_type: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Deselected => f.write_str("not selected"),
            SkipReason::MissingRadiationData {
                beamline,
                radiation_type,
            } => write!(
                f,
                "beamline {} has no model for radiation type {}",
                beamline, radiation_type
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBeam {
    pub beam_id: BeamId,
    pub beam_name: String,
    pub reason: SkipReason,
}

/// Human-readable record of every compile decision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileSummary {
    pub header: String,
    pub lines: Vec<String>,
    pub skipped: Vec<SkippedBeam>,
    /// Decisions worth a warning (skips for missing data, correction fallbacks)
    pub warnings: Vec<String>,
}

impl CompileSummary {
    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.lines.push(format!("WARNING: {}", text));
        self.warnings.push(text);
    }

    fn skip(&mut self, beam: &Beam, reason: SkipReason) {
        self.line(format!("beam {} ({}): SKIPPED, {}", beam.number, beam.name, reason));
        self.skipped.push(SkippedBeam {
            beam_id: beam.id.clone(),
            beam_name: beam.name.clone(),
            reason,
        });
    }
}

impl fmt::Display for CompileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CompiledPlan {
    /// Job specs keyed by beam id, in plan order
    pub specs: IndexMap<BeamId, JobSpec>,
    pub summary: CompileSummary,
}

pub struct JobGraphCompiler<B> {
    config: Arc<SystemConfig>,
    catalog: B,
}

/// Per-compilation bookkeeping
#[derive(Default)]
struct CompileState {
    artifact_names: HashSet<String>,
    models: HashMap<String, Option<BeamlineModel>>,
    /// Beamlines whose shared files were already copied
    installed: HashSet<String>,
}

impl<B: BeamlineCatalog> JobGraphCompiler<B> {
    pub fn new(config: Arc<SystemConfig>, catalog: B) -> Self {
        Self { config, catalog }
    }

    pub fn compile(
        &self,
        plan: &PlanDetails,
        layout: &WorkspaceLayout,
    ) -> Result<CompiledPlan, JobError> {
        plan.check_text()?;
        let mut summary = CompileSummary {
            header: format!(
                "plan {} for user {}, geometry {}",
                plan.uid, plan.user, plan.geometry
            ),
            ..CompileSummary::default()
        };
        let mut state = CompileState::default();
        let mut specs = IndexMap::new();

        for beam in &plan.beams {
            if let Some(spec) = self.compile_beam(plan, beam, layout, &mut state, &mut summary)? {
                specs.insert(beam.id.clone(), spec);
            }
        }

        summary.line(format!(
            "{} of {} beams compiled",
            specs.len(),
            plan.beams.len()
        ));
        tracing::info!(
            plan = %plan.uid,
            compiled = specs.len(),
            skipped = summary.skipped.len(),
            "plan compiled"
        );
        Ok(CompiledPlan { specs, summary })
    }

    fn compile_beam(
        &self,
        plan: &PlanDetails,
        beam: &Beam,
        layout: &WorkspaceLayout,
        state: &mut CompileState,
        summary: &mut CompileSummary,
    ) -> Result<Option<JobSpec>, JobError> {
        if !beam.selected {
            summary.skip(beam, SkipReason::Deselected);
            return Ok(None);
        }

        let class = RadiationClass::of(&beam.radiation_type).ok_or_else(|| {
            JobError::Configuration(format!(
                "beam {} ({}): unsupported radiation type '{}'",
                beam.number, beam.name, beam.radiation_type
            ))
        })?;

        let beamline = plan.beamline_for(beam).to_string();
        let Some(model) = self.model(&beamline, state)? else {
            return Err(JobError::Configuration(format!(
                "beam {} ({}): unknown beamline '{}'",
                beam.number, beam.name, beamline
            )));
        };
        let Some(source_properties) = model.source_properties_for(&beam.radiation_type) else {
            let reason = SkipReason::MissingRadiationData {
                beamline: beamline.clone(),
                radiation_type: beam.radiation_type.clone(),
            };
            tracing::warn!(beam = %beam.id, %reason, "skipping beam");
            summary.warn(format!("beam {} ({}): {}", beam.number, beam.name, reason));
            summary.skip(beam, reason);
            return Ok(None);
        };

        let sanitized = sanitize_name(&beam.name);
        let stem = format!(
            "{}-beam{}-{}",
            sanitize_name(&plan.beamset_name),
            beam.number,
            sanitized
        );
        if !state.artifact_names.insert(stem.clone()) {
            return Err(JobError::Configuration(format!(
                "duplicate configuration artifact name '{}'",
                stem
            )));
        }

        let name_note = if sanitized != beam.name {
            format!("{} (as {})", beam.name, sanitized)
        } else {
            beam.name.clone()
        };
        summary.line(format!(
            "beam {} {}: {} on {}, physics {}",
            beam.number,
            name_note,
            beam.radiation_type,
            beamline,
            self.config.physics_list(class)
        ));

        let overrides = plan.overrides.get(&beam.id);
        let shifters = resolve_devices(
            "range shifters",
            &beam.range_shifters,
            overrides.and_then(|o| o.range_shifters.as_ref()),
            summary,
        );
        let modulators = resolve_devices(
            "range modulators",
            &beam.range_modulators,
            overrides.and_then(|o| o.range_modulators.as_ref()),
            summary,
        );

        let (dose_correction, is_default) = self
            .config
            .correction_factor(&beamline, &beam.radiation_type);
        if is_default {
            summary.warn(format!(
                "beam {}: no dose correction for {} / {}, using default {}",
                beam.number, beamline, beam.radiation_type, dose_correction
            ));
        } else {
            summary.line(format!("  dose correction {}", dose_correction));
        }

        self.install_beamline(&model, layout, state)?;
        let source = install_file(source_properties, &beamline_data_dir(layout, &beamline))?;
        let mut includes = Vec::new();
        for id in &shifters {
            let file = model.range_shifter(id).ok_or_else(|| {
                JobError::Configuration(format!("beamline {} has no range shifter '{}'", beamline, id))
            })?;
            includes.push(install_macro(file, &beamline, layout)?);
        }
        for id in &modulators {
            let file = model.range_modulator(id).ok_or_else(|| {
                JobError::Configuration(format!(
                    "beamline {} has no range modulator '{}'",
                    beamline, id
                ))
            })?;
            includes.push(install_macro(file, &beamline, layout)?);
        }

        let (isocenter, dose_to_water) = match &plan.geometry {
            GeometryMode::Volumetric { .. } => (beam.isocenter, false),
            GeometryMode::Phantom(spec) => match spec.isocenters.get(&beam.id) {
                Some(iso) => (*iso, spec.dose_to_water),
                None => {
                    summary.line(format!(
                        "  no phantom isocenter given, using planned {}",
                        encode_isocenter(beam.isocenter)
                    ));
                    (beam.isocenter, spec.dose_to_water)
                }
            },
        };

        let job_count = if plan.cores > 0 {
            plan.cores
        } else {
            self.config.compute.number_of_cores
        };
        let memory_mb = plan.memory_mb.unwrap_or_else(|| {
            self.config
                .memory
                .estimate_mb(plan.geometry_voxels(), class)
        });

        let spec = JobSpec {
            beam_id: beam.id.clone(),
            beam_number: beam.number,
            beam_name: beam.name.clone(),
            sanitized_name: sanitized,
            radiation_type: beam.radiation_type.clone(),
            beamline: beamline.clone(),
            config_artifact: PathBuf::from("mac").join(format!("{}.mac", stem)),
            output_artifact: PathBuf::from("output").join(format!("{}-dose.mhd", stem)),
            job_count,
            memory_mb,
            dose_correction,
            correction_is_default: is_default,
            isocenter: encode_isocenter(isocenter),
            dose_to_water,
        };

        let macro_text = render_beam_macro(
            plan,
            beam,
            &spec,
            self.config.physics_list(class),
            &relative(&layout.root, &source),
            &model
                .details
                .iter()
                .map(|d| macro_path(d, &beamline))
                .collect::<Vec<_>>(),
            &includes,
        );
        write_file(&layout.root.join(&spec.config_artifact), macro_text.as_bytes())?;
        summary.line(format!(
            "  {} x{} tasks, {} MB",
            spec.config_artifact.display(),
            spec.job_count,
            spec.memory_mb
        ));

        Ok(Some(spec))
    }

    fn model(&self, name: &str, state: &mut CompileState) -> Result<Option<BeamlineModel>, JobError> {
        if let Some(cached) = state.models.get(name) {
            return Ok(cached.clone());
        }
        let model = self.catalog.lookup(name)?;
        state.models.insert(name.to_string(), model.clone());
        Ok(model)
    }

    /// Copy detail macros and auxiliary data once per beamline.
    fn install_beamline(
        &self,
        model: &BeamlineModel,
        layout: &WorkspaceLayout,
        state: &mut CompileState,
    ) -> Result<(), JobError> {
        if !state.installed.insert(model.name.clone()) {
            return Ok(());
        }
        for detail in &model.details {
            install_macro(detail, &model.name, layout)?;
        }
        let data_dir = beamline_data_dir(layout, &model.name);
        for aux in &model.aux_data {
            copy_any_into(aux, &data_dir)?;
        }
        Ok(())
    }
}

/// Pick override or planned devices and annotate which was used.
fn resolve_devices(
    kind: &str,
    planned: &[String],
    overridden: Option<&Vec<String>>,
    summary: &mut CompileSummary,
) -> Vec<String> {
    let (devices, tag) = match overridden {
        Some(devices) => (devices.clone(), "(OVERRIDE)"),
        None => (planned.to_vec(), "(as PLANNED)"),
    };
    if overridden.is_some() || !devices.is_empty() {
        let list = if devices.is_empty() {
            "none".to_string()
        } else {
            devices.join(", ")
        };
        summary.line(format!("  {}: {} {}", kind, list, tag));
    }
    devices
}

fn beamline_data_dir(layout: &WorkspaceLayout, beamline: &str) -> PathBuf {
    layout.data_dir().join(sanitize_name(beamline))
}

fn macro_path(file: &Path, beamline: &str) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("mac/{}-{}", sanitize_name(beamline), name)
}

/// Copy a beamline macro to `mac/<beamline>-<file>`; returns the relative path.
fn install_macro(file: &Path, beamline: &str, layout: &WorkspaceLayout) -> Result<String, JobError> {
    let rel = macro_path(file, beamline);
    let dst = layout.root.join(&rel);
    if !dst.exists() {
        copy_file(file, &dst)?;
    }
    Ok(rel)
}

fn install_file(file: &Path, dir: &Path) -> Result<PathBuf, JobError> {
    let name = file.file_name().unwrap_or_default();
    let dst = dir.join(name);
    if !dst.exists() {
        copy_file(file, &dst)?;
    }
    Ok(dst)
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Configuration macro consumed by the compute task
fn render_beam_macro(
    plan: &PlanDetails,
    beam: &Beam,
    spec: &JobSpec,
    physics_list: &str,
    source_properties: &str,
    details: &[String],
    includes: &[String],
) -> String {
    let geometry = match &plan.geometry {
        GeometryMode::Volumetric { .. } => "CT".to_string(),
        GeometryMode::Phantom(p) => format!("PHANTOM {}", p.label),
    };
    let mut out = String::new();
    out.push_str(&format!(
        "# beam {} \"{}\" of plan {} ({})\n",
        beam.number, beam.name, plan.uid, plan.beamset_name
    ));
    let aliases = [
        ("BEAMNAME", spec.sanitized_name.clone()),
        ("BEAMNUMBER", beam.number.to_string()),
        ("RADIATION_TYPE", spec.radiation_type.clone()),
        ("PHYSICS_LIST", physics_list.to_string()),
        ("BEAMLINE", spec.beamline.clone()),
        ("SOURCE_PROPERTIES", source_properties.to_string()),
        ("GEOMETRY", geometry),
        ("ISOCENTER", spec.isocenter.clone()),
        ("GANTRY_ANGLE", beam.gantry_angle.to_string()),
        ("COUCH_ANGLE", beam.patient_angle.to_string()),
        ("DOSE_CORRECTION", spec.dose_correction.to_string()),
        ("DOSE_TO_WATER", spec.dose_to_water.to_string()),
        ("DOSE_OUTPUT", spec.output_artifact.display().to_string()),
        ("MIN_PRIMARIES", plan.stopping.min_particles.to_string()),
    ];
    for (key, value) in aliases {
        out.push_str(&format!("/control/alias {} {}\n", key, value));
    }
    for file in details.iter().chain(includes) {
        out.push_str(&format!("/control/execute {}\n", file));
    }
    out
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
