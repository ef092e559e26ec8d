// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures for engine tests and workspace-level specs.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::beamline::DirectoryCatalog;
use crate::compiler::{CompiledPlan, JobGraphCompiler};
use crate::descriptor::{expected_plan_dose, SubmitDescriptorWriter};
use crate::error::JobError;
use crate::monitor::{acquire_monitor_lock, Aggregator};
use crate::workspace::WorkspaceBuilder;
use async_trait::async_trait;
use mc_core::test_support::config_rooted_at;
use mc_core::{JobRecord, PlanDetails, SystemConfig, WorkspaceLayout};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Lay out commissioning data under `root` and return a config pointing at it.
///
/// Beamlines: `IR2HBL` (proton only, with `RS3`/`RM1`) and `IR2VBL`
/// (proton and carbon ions).
pub fn install_commissioning(root: &Path) -> std::io::Result<SystemConfig> {
    write(&root.join("commissioning/materials.db"), "[Materials]\n")?;

    write(&root.join("ct/ct-parameters.mac"), "/control/alias CT 1\n")?;
    write(&root.join("ct/density-headneck.txt"), "-1000 1.21e-3\n")?;
    write(&root.join("ct/hu2mat-headneck.txt"), "-1000 -950 Air\n")?;
    write(&root.join("ct/humat-headneck.db"), "[Materials]\n")?;

    write(&root.join("phantoms/water_box/geometry.mac"), "/gate/world\n")?;

    let hbl = root.join("beamlines/IR2HBL");
    write(
        &hbl.join("beamline.toml"),
        r#"details = ["IR2HBL-details.mac"]
aux_data = ["aperture"]

[source_properties]
proton = "source-proton.txt"

[range_shifters]
RS3 = "rs3.mac"

[range_modulators]
RM1 = "rm1.mac"
"#,
    )?;
    write(&hbl.join("IR2HBL-details.mac"), "/gate/geometry\n")?;
    write(&hbl.join("aperture/nozzle.dat"), "nozzle\n")?;
    write(&hbl.join("source-proton.txt"), "proton source\n")?;
    write(&hbl.join("rs3.mac"), "/gate/rs3\n")?;
    write(&hbl.join("rm1.mac"), "/gate/rm1\n")?;

    let vbl = root.join("beamlines/IR2VBL");
    write(
        &vbl.join("beamline.toml"),
        r#"details = ["IR2VBL-details.mac"]

[source_properties]
PROTON = "source-proton.txt"
"ION 6 12 6" = "source-carbon.txt"
"#,
    )?;
    write(&vbl.join("IR2VBL-details.mac"), "/gate/geometry\n")?;
    write(&vbl.join("source-proton.txt"), "proton source\n")?;
    write(&vbl.join("source-carbon.txt"), "carbon source\n")?;

    std::fs::create_dir_all(root.join("bin"))?;
    Ok(config_rooted_at(root))
}

/// A workspace with compiled specs and descriptors, ready for submission
pub struct StagedPlan {
    pub config: Arc<SystemConfig>,
    pub layout: WorkspaceLayout,
    pub compiled: CompiledPlan,
}

/// Install commissioning data under `root`, then build, compile and emit `plan`.
pub fn stage_plan(root: &Path, plan: &PlanDetails) -> Result<StagedPlan, JobError> {
    let config = Arc::new(install_commissioning(root).map_err(|e| JobError::io(root, e))?);
    let layout = WorkspaceBuilder::new(Arc::clone(&config)).create(plan)?;
    let compiled = JobGraphCompiler::new(
        Arc::clone(&config),
        DirectoryCatalog::new(&config.paths.beamlines_dir),
    )
    .compile(plan, &layout)?;
    SubmitDescriptorWriter::new(Arc::clone(&config)).emit(&layout, &compiled.specs, plan)?;
    Ok(StagedPlan {
        config,
        layout,
        compiled,
    })
}

/// Hold `layout`'s monitor lock on behalf of `pid`, as a running monitor would.
pub fn hold_monitor_lock(layout: &WorkspaceLayout, pid: u32) -> Result<std::fs::File, JobError> {
    acquire_monitor_lock(&layout.monitor_lock_path(), pid)?
        .ok_or_else(|| JobError::Validation("monitor lock already held".to_string()))
}

/// Write a compute task's progress report (`output/<task>/stats.json`).
pub fn write_task_stats(
    layout: &WorkspaceLayout,
    task: &str,
    particles: u64,
    uncertainty: Option<f64>,
) -> std::io::Result<()> {
    let body = match uncertainty {
        Some(u) => format!("{{\"particles\": {particles}, \"uncertainty\": {u}}}"),
        None => format!("{{\"particles\": {particles}}}"),
    };
    write(&layout.output_dir().join(task).join("stats.json"), &body)
}

/// Aggregator that records calls and writes the final artifacts itself
#[derive(Clone, Default)]
pub struct RecordingAggregator {
    calls: Arc<Mutex<u32>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl Aggregator for RecordingAggregator {
    async fn aggregate(&self, layout: &WorkspaceLayout, _record: &JobRecord) -> Result<(), JobError> {
        *self.calls.lock() += 1;
        if *self.fail.lock() {
            return Err(JobError::Scheduler("post-processing failed".to_string()));
        }
        let output = layout.output_dir();
        std::fs::create_dir_all(&output).map_err(|e| JobError::io(&output, e))?;
        let dose = output.join(expected_plan_dose(layout)?);
        std::fs::write(&dose, b"DICM plan dose").map_err(|e| JobError::io(&dose, e))?;
        let report = output.join("report.cfg");
        std::fs::write(&report, "status = FINISHED\n").map_err(|e| JobError::io(&report, e))?;
        Ok(())
    }
}
