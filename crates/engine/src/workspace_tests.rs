// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::install_commissioning;
use mc_core::test_support::{ct_plan, phantom_plan, proton_beam};

fn builder(root: &Path) -> WorkspaceBuilder {
    WorkspaceBuilder::new(Arc::new(install_commissioning(root).unwrap()))
}

#[test]
fn phantom_workspace_has_layout_and_reference_data() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let layout = builder(tmp.path()).create(&plan).unwrap();

    assert_eq!(layout.index, 1);
    assert_eq!(
        layout.root,
        tmp.path().join("jobs/tester/1_2_826_0_1_3680043_2/run.1")
    );
    for sub in SUBDIRS {
        assert!(layout.root.join(sub).is_dir(), "missing {sub}");
    }
    assert!(layout.data_dir().join("materials.db").is_file());
    assert!(layout
        .data_dir()
        .join("phantoms/water_box/geometry.mac")
        .is_file());
    assert!(!layout.data_dir().join("CT").exists());
}

#[cfg(unix)]
#[test]
fn tmp_dir_is_world_writable() {
    use std::os::unix::fs::PermissionsExt;
    let tmp = tempfile::tempdir().unwrap();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    let layout = builder(tmp.path()).create(&plan).unwrap();

    let mode = fs::metadata(layout.tmp_dir()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o777);
}

#[test]
fn volumetric_workspace_copies_calibration() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = ct_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let layout = builder(tmp.path()).create(&plan).unwrap();

    let ct = layout.data_dir().join("CT");
    for name in [
        "ct-parameters.mac",
        "density-headneck.txt",
        "hu2mat-headneck.txt",
        "humat-headneck.db",
        "preprocess.json",
    ] {
        assert!(ct.join(name).is_file(), "missing {name}");
    }
    let preprocess: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ct.join("preprocess.json")).unwrap()).unwrap();
    assert_eq!(preprocess["protocol"], "HeadNeck");
    assert_eq!(preprocess["density"], "data/CT/density-headneck.txt");
    assert!(!layout.data_dir().join("phantoms").exists());
}

#[test]
fn indices_increase_and_are_never_reused() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = builder(tmp.path());
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let first = builder.create(&plan).unwrap();
    let second = builder.create(&plan).unwrap();
    assert_eq!((first.index, second.index), (1, 2));
    assert_ne!(first.job_id, second.job_id);

    // A deleted attempt below the maximum does not free its slot
    fs::remove_dir_all(&first.root).unwrap();
    assert_eq!(builder.create(&plan).unwrap().index, 3);
}

#[test]
fn concurrent_builders_never_share_an_index() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Arc::new(install_commissioning(tmp.path()).unwrap());
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let builder = WorkspaceBuilder::new(Arc::clone(&config));
            let plan = plan.clone();
            std::thread::spawn(move || builder.create(&plan).unwrap().index)
        })
        .collect();
    let mut indices: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    indices.sort_unstable();
    assert_eq!(indices, (1..=8).collect::<Vec<_>>());
}

#[test]
fn unknown_ct_protocol_is_configuration_error_and_claims_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut plan = ct_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    plan.geometry = GeometryMode::Volumetric {
        ct_protocol: "Pelvis".to_string(),
        voxel_count: 1,
    };

    let err = builder(tmp.path()).create(&plan).unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)), "got: {err}");
    assert!(!tmp.path().join("jobs").exists());
}

#[test]
fn unknown_phantom_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    if let GeometryMode::Phantom(spec) = &mut plan.geometry {
        spec.label = "lung_slab".to_string();
    }
    let err = builder(tmp.path()).create(&plan).unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));
}

#[test]
fn missing_copy_source_retires_the_attempt() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = builder(tmp.path());
    fs::remove_file(tmp.path().join("commissioning/materials.db")).unwrap();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let err = builder.create(&plan).unwrap_err();
    assert!(matches!(err, JobError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("materials.db"));

    let parent = tmp.path().join("jobs/tester/1_2_826_0_1_3680043_2");
    assert!(!parent.join("run.1").exists());
    assert!(parent.join("run.1.failed").is_dir());

    // The failed index stays consumed
    assert_eq!(next_index(&parent).unwrap(), 2);
}
