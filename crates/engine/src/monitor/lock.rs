// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workspace's monitor lock (`tmp/monitor.lock`).
//!
//! The running monitor holds an exclusive lock on the file for its whole
//! lifetime and records its pid inside. A pid in the file only identifies
//! the monitor while the lock is still held.

use crate::error::JobError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Take the lock and record `pid` in it.
///
/// Returns `None` when another process already holds it. The lock is
/// released when the returned file is dropped.
pub fn acquire_monitor_lock(path: &Path, pid: u32) -> Result<Option<File>, JobError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| JobError::io(parent, e))?;
    }
    // Don't truncate before holding the lock; the holder's pid lives here
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| JobError::io(path, e))?;
    if FileExt::try_lock_exclusive(&file).is_err() {
        return Ok(None);
    }

    file.set_len(0).map_err(|e| JobError::io(path, e))?;
    writeln!(file, "{}", pid).map_err(|e| JobError::io(path, e))?;
    file.sync_all().map_err(|e| JobError::io(path, e))?;
    Ok(Some(file))
}

/// Pid recorded in a lock file, held or not
pub fn lock_holder(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Pid of the monitor currently holding the lock.
///
/// `None` when no process holds it, whatever pid the file still names.
pub fn live_monitor(path: &Path) -> Result<Option<u32>, JobError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(JobError::io(path, e)),
    };
    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            FileExt::unlock(&file).map_err(|e| JobError::io(path, e))?;
            Ok(None)
        }
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Ok(lock_holder(path))
        }
        Err(e) => Err(JobError::io(path, e)),
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
