// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem copy and write helpers that report the failing path

use crate::error::JobError;
use mc_core::status_file::write_atomic;
use std::fs;
use std::path::{Path, PathBuf};

/// Copy `src` into directory `dst_dir`, keeping its file name.
pub(crate) fn copy_into(src: &Path, dst_dir: &Path) -> Result<PathBuf, JobError> {
    let name = src
        .file_name()
        .ok_or_else(|| JobError::Validation(format!("not a file path: {}", src.display())))?;
    let dst = dst_dir.join(name);
    copy_file(src, &dst)?;
    Ok(dst)
}

/// Copy one file, creating the destination's parent.
pub(crate) fn copy_file(src: &Path, dst: &Path) -> Result<(), JobError> {
    if !src.is_file() {
        return Err(JobError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "copy source missing"),
        ));
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| JobError::io(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| JobError::io(dst, e))?;
    Ok(())
}

/// Recursively copy directory `src` to `dst`.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<(), JobError> {
    if !src.is_dir() {
        return Err(JobError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "copy source missing"),
        ));
    }
    fs::create_dir_all(dst).map_err(|e| JobError::io(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| JobError::io(src, e))? {
        let entry = entry.map_err(|e| JobError::io(src, e))?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
        }
    }
    Ok(())
}

/// Copy a file or a directory tree into `dst_dir`.
pub(crate) fn copy_any_into(src: &Path, dst_dir: &Path) -> Result<PathBuf, JobError> {
    if src.is_dir() {
        let name = src.file_name().unwrap_or_default();
        let dst = dst_dir.join(name);
        copy_tree(src, &dst)?;
        Ok(dst)
    } else {
        copy_into(src, dst_dir)
    }
}

/// Write through a sibling temp file and rename, so readers never see a
/// half-written macro or descriptor.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), JobError> {
    write_atomic(path, contents).map_err(|e| JobError::io(path, e))
}

#[cfg(test)]
#[path = "fsutil_tests.rs"]
mod tests;
