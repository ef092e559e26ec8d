// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn write_file_creates_parents_and_leaves_no_temp_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("run.1/mac/beam.mac");

    write_file(&path, b"/control/alias A 1\n").unwrap();
    write_file(&path, b"/control/alias A 2\n").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"/control/alias A 2\n");
    let names: Vec<String> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["beam.mac"]);
}

#[test]
fn copy_of_missing_source_is_io_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let err = copy_file(&tmp.path().join("absent"), &tmp.path().join("dst")).unwrap_err();
    assert!(matches!(err, JobError::Io { .. }));
}
