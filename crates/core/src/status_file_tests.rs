// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn missing_artifact_reads_as_created() {
    let dir = tempdir().unwrap();
    let artifact = read_status(&dir.path().join("status.json")).unwrap();
    assert_eq!(artifact, StatusArtifact::new(Status::Created));
}

#[test]
fn write_then_read_keeps_reason() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.json");
    let written = StatusArtifact::with_reason(Status::Finished, FinishReason::ParticleCount);
    write_status(&path, &written).unwrap();

    assert_eq!(read_status(&path).unwrap(), written);
    assert!(!dir.path().join("status.json.tmp").exists());
}

#[test]
fn reason_is_omitted_when_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.json");
    write_status(&path, &StatusArtifact::new(Status::Running)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("reason"), "got: {text}");
    assert!(text.contains("\"RUNNING\""));
}

#[yare::parameterized(
    upper    = { "RUNNING\n", Status::Running },
    lower    = { "finished", Status::Finished },
    padded   = { "  CANCELLED  ", Status::Cancelled },
)]
fn bare_status_word_is_accepted(text: &str, expected: Status) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, text).unwrap();
    assert_eq!(read_status(&path).unwrap().status, expected);
}

#[test]
fn truncated_document_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, "{\"status\": \"RUN").unwrap();
    assert!(matches!(
        read_status(&path),
        Err(StatusFileError::Corrupt { .. })
    ));
}

#[test]
fn advance_follows_state_machine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("status.json");

    advance(&path, Status::Submitted, None).unwrap();
    advance(&path, Status::Running, None).unwrap();
    let done = advance(&path, Status::Finished, Some(FinishReason::Timeout)).unwrap();
    assert_eq!(done.reason, Some(FinishReason::Timeout));

    let err = advance(&path, Status::Cancelled, None).unwrap_err();
    assert!(matches!(err, StatusFileError::Transition(_)));
    assert_eq!(read_status(&path).unwrap().status, Status::Finished);
}

#[test]
fn markers_are_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tmp").join("STOP");
    assert!(!marker_present(&path));
    touch_marker(&path).unwrap();
    touch_marker(&path).unwrap();
    assert!(marker_present(&path));
}
