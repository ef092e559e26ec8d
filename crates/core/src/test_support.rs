// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::config::{
    Calibration, Compute, Identity, MemoryModel, MonitorSettings, Paths, SchedulerSettings,
    SystemConfig,
};
use crate::id::{BeamId, PlanId};
use crate::plan::{Beam, GeometryMode, PhantomSpec, PlanDetails, StoppingCriteria};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ── Plan factory functions ──────────────────────────────────────────────────

pub fn proton_beam(id: &str, number: u32, machine: &str) -> Beam {
    Beam {
        id: BeamId::new(id),
        number,
        name: id.to_string(),
        radiation_type: "PROTON".to_string(),
        treatment_machine: machine.to_string(),
        range_shifters: Vec::new(),
        range_modulators: Vec::new(),
        isocenter: [0.0, 0.0, 0.0],
        gantry_angle: 90.0,
        patient_angle: 0.0,
        selected: true,
    }
}

pub fn ion_beam(id: &str, number: u32, machine: &str) -> Beam {
    Beam {
        radiation_type: "ION 6 12 6".to_string(),
        ..proton_beam(id, number, machine)
    }
}

pub fn particle_goal(min_particles: u64) -> StoppingCriteria {
    StoppingCriteria {
        min_particles,
        uncertainty_goal: 0.0,
        timeout_secs: 3600,
    }
}

pub fn phantom_plan(beams: Vec<Beam>) -> PlanDetails {
    PlanDetails {
        uid: PlanId::new("1.2.826.0.1.3680043.2"),
        user: "tester".to_string(),
        beamset_name: "Test Plan".to_string(),
        beams,
        geometry: GeometryMode::Phantom(PhantomSpec {
            label: "water_box".to_string(),
            dose_to_water: true,
            isocenters: BTreeMap::new(),
        }),
        stopping: particle_goal(10_000),
        priority: 0,
        overrides: BTreeMap::new(),
        beamline_override: None,
        cores: 0,
        memory_mb: None,
        dose_voxels: 2_000_000,
    }
}

pub fn ct_plan(beams: Vec<Beam>) -> PlanDetails {
    PlanDetails {
        geometry: GeometryMode::Volumetric {
            ct_protocol: "HeadNeck".to_string(),
            voxel_count: 8_000_000,
        },
        ..phantom_plan(beams)
    }
}

// ── Configuration fixtures ──────────────────────────────────────────────────

pub fn sample_config_toml() -> &'static str {
    r#"
[identity]
username = "mcuser"

[paths]
jobs_dir = "/srv/jobs"
commissioning_dir = "/srv/commissioning"
materials_database = "materials.db"
ct_dir = "/srv/ct"
phantoms_dir = "/srv/phantoms"
beamlines_dir = "/srv/beamlines"
bindir = "/srv/bin"

[compute]
number_of_cores = 4

[memory]
base_mb = 1000
mb_per_mvoxel = 100.0
ion_surcharge_mb = 500

[correction_factors]
default = 1.0
ir2hbl_proton = 0.97

[calibrations.HeadNeck]
density = "density-headneck.txt"
hu_to_material = "hu2mat-headneck.txt"
hu_material_db = "humat-headneck.db"
"#
}

/// Sample configuration with every directory under `root`.
pub fn config_rooted_at(root: &Path) -> SystemConfig {
    SystemConfig {
        identity: Identity {
            username: "mcuser".to_string(),
            debug: false,
        },
        paths: Paths {
            jobs_dir: root.join("jobs"),
            commissioning_dir: root.join("commissioning"),
            materials_database: PathBuf::from("materials.db"),
            ct_dir: root.join("ct"),
            phantoms_dir: root.join("phantoms"),
            beamlines_dir: root.join("beamlines"),
            bindir: root.join("bin"),
        },
        compute: Compute {
            number_of_cores: 4,
            proton_physics_list: "QGSP_BIC_HP_EMZ".to_string(),
            ion_physics_list: "Shielding_EMZ".to_string(),
            next_job_start_delay_secs: 0,
        },
        memory: MemoryModel {
            base_mb: 1000,
            mb_per_mvoxel: 100.0,
            ion_surcharge_mb: 500,
        },
        correction_factors: BTreeMap::from([
            ("default".to_string(), 1.0),
            ("ir2hbl_proton".to_string(), 0.97),
        ]),
        calibrations: BTreeMap::from([(
            "HeadNeck".to_string(),
            Calibration {
                density: PathBuf::from("density-headneck.txt"),
                hu_to_material: PathBuf::from("hu2mat-headneck.txt"),
                hu_material_db: PathBuf::from("humat-headneck.db"),
            },
        )]),
        monitor: MonitorSettings::default(),
        scheduler: SchedulerSettings::default(),
    }
}
