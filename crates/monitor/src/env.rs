// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the monitor crate.

use std::path::PathBuf;

/// Config file override: MCJOB_CONFIG
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os("MCJOB_CONFIG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
