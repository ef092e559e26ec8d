// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain     = { "run.3", Some(3) },
    failed    = { "run.12.failed", Some(12) },
    zero      = { "run.0", Some(0) },
    no_digits = { "run.", None },
    other     = { "rungate.1", None },
    garbage   = { "run.x", None },
)]
fn attempt_index_parsing(name: &str, expected: Option<u32>) {
    assert_eq!(parse_attempt_index(name), expected);
}

#[test]
fn attempts_dir_sanitizes_components() {
    let dir = attempts_dir(Path::new("/jobs"), "dr who", &PlanId::new("1.2.3"));
    assert_eq!(dir, Path::new("/jobs/dr_who/1_2_3"));
}

#[test]
fn open_derives_job_id_from_path() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("alice").join("1_2_3").join("run.4");
    std::fs::create_dir_all(&root).unwrap();

    let layout = WorkspaceLayout::open(&root).unwrap();
    assert_eq!(layout.index, 4);
    assert_eq!(layout.job_id, "alice_1_2_3_4");
    assert_eq!(layout.status_path(), root.join("status.json"));
    assert_eq!(layout.stop_marker(), root.join("tmp").join("STOP"));
}

#[test]
fn open_rejects_failed_attempts() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("alice").join("plan").join("run.1.failed");
    std::fs::create_dir_all(&root).unwrap();

    let err = WorkspaceLayout::open(&root).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn open_rejects_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("alice").join("plan").join("run.1");
    let err = WorkspaceLayout::open(&root).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}
