// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::path::PathBuf;
use std::time::Duration;

/// Directory holding the HTCondor CLI tools (default: resolve via `PATH`).
pub fn condor_bin_dir() -> Option<PathBuf> {
    std::env::var_os("MCJOB_CONDOR_BIN").map(PathBuf::from)
}

/// Grace period between SIGTERM and SIGKILL when stopping a monitor (default: 5000ms).
pub fn kill_grace() -> Duration {
    std::env::var("MCJOB_KILL_GRACE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
