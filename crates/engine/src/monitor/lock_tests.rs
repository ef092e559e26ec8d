// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn lock_path(tmp: &tempfile::TempDir) -> std::path::PathBuf {
    tmp.path().join("run.1/tmp/monitor.lock")
}

#[test]
fn lock_is_exclusive_and_records_pid() {
    let tmp = tempfile::tempdir().unwrap();
    let path = lock_path(&tmp);

    let held = acquire_monitor_lock(&path, 4242).unwrap();
    assert!(held.is_some());
    assert_eq!(lock_holder(&path), Some(4242));
    assert!(acquire_monitor_lock(&path, 4343).unwrap().is_none());
    assert_eq!(lock_holder(&path), Some(4242));

    drop(held);
    assert!(acquire_monitor_lock(&path, 4343).unwrap().is_some());
    assert_eq!(lock_holder(&path), Some(4343));
}

#[test]
fn live_monitor_requires_a_held_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let path = lock_path(&tmp);
    assert_eq!(live_monitor(&path).unwrap(), None);

    let held = acquire_monitor_lock(&path, 4242).unwrap();
    assert_eq!(live_monitor(&path).unwrap(), Some(4242));

    // The pid stays in the file after the monitor is gone
    drop(held);
    assert_eq!(lock_holder(&path), Some(4242));
    assert_eq!(live_monitor(&path).unwrap(), None);
}

#[test]
fn checking_does_not_take_the_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let path = lock_path(&tmp);
    let held = acquire_monitor_lock(&path, 4242).unwrap();
    drop(held);

    // A check against a released lock must release its own shared lock
    assert_eq!(live_monitor(&path).unwrap(), None);
    assert_eq!(live_monitor(&path).unwrap(), None);
    assert!(acquire_monitor_lock(&path, 4343).unwrap().is_some());
}
