// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::install_commissioning;

#[yare::parameterized(
    proton = { "PROTON", "proton" },
    carbon = { "ION 6 12 6", "ion_6_12_6" },
    padded = { " proton ", "proton" },
)]
fn radiation_keys(radiation_type: &str, expected: &str) {
    assert_eq!(radiation_key(radiation_type), expected);
}

#[test]
fn directory_catalog_resolves_paths_against_model_dir() {
    let tmp = tempfile::tempdir().unwrap();
    install_commissioning(tmp.path()).unwrap();
    let catalog = DirectoryCatalog::new(tmp.path().join("beamlines"));

    let model = catalog.lookup("IR2HBL").unwrap().unwrap();
    let dir = tmp.path().join("beamlines/IR2HBL");
    assert_eq!(model.dir, dir);
    assert_eq!(model.details, vec![dir.join("IR2HBL-details.mac")]);
    assert_eq!(model.range_shifter("RS3"), Some(dir.join("rs3.mac").as_path()));
    assert!(model.range_modulator("RM9").is_none());
}

#[test]
fn support_is_decided_by_source_properties() {
    let tmp = tempfile::tempdir().unwrap();
    install_commissioning(tmp.path()).unwrap();
    let catalog = DirectoryCatalog::new(tmp.path().join("beamlines"));

    let hbl = catalog.lookup("IR2HBL").unwrap().unwrap();
    assert!(hbl.supports("PROTON"));
    assert!(!hbl.supports("ION 6 12 6"));

    let vbl = catalog.lookup("IR2VBL").unwrap().unwrap();
    assert!(vbl.supports("ion 6 12 6"));
    assert!(vbl.source_properties_for("PROTON").is_some());
}

#[test]
fn unknown_beamline_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = DirectoryCatalog::new(tmp.path());
    assert!(catalog.lookup("IR9").unwrap().is_none());
}

#[test]
fn malformed_model_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("BAD");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MODEL_FILE), "details = 3").unwrap();

    let err = DirectoryCatalog::new(tmp.path()).lookup("BAD").unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));
}
