// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor start-up: workspace lock, logging, inputs

use mc_core::config::resolve_config_path;
use mc_core::{ConfigError, JobRecord, RecordError, SystemConfig, WorkspaceLayout};
use mc_engine::monitor::acquire_monitor_lock;
use mc_engine::JobError;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("not a job workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("another monitor holds {0}")]
    LockFailed(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Lock(#[from] JobError),
    #[error("invalid arguments: {0}")]
    Arguments(String),
}

pub fn open_workspace(path: &Path) -> Result<WorkspaceLayout, StartupError> {
    WorkspaceLayout::open(path).map_err(|source| StartupError::Workspace {
        path: path.to_path_buf(),
        source,
    })
}

/// Exclusive lock on the workspace's monitor lock file.
///
/// Holds the lock for as long as the returned file lives. The file contains
/// the holder's pid.
pub fn acquire_lock(path: &Path) -> Result<File, StartupError> {
    acquire_monitor_lock(path, std::process::id())?
        .ok_or_else(|| StartupError::LockFailed(path.to_path_buf()))
}

/// Install the tracing subscriber.
///
/// Daemon mode writes to `logs/monitor.log` through a non-blocking appender;
/// the returned guard flushes it on drop. Otherwise logs go to stderr.
pub fn setup_logging(
    layout: &WorkspaceLayout,
    daemon: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, StartupError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !daemon {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    }

    let log_path = layout.monitor_log_path();
    let dir = log_path.parent().unwrap_or(&layout.root).to_path_buf();
    std::fs::create_dir_all(&dir)?;
    let file_name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "monitor.log".into());
    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}

/// Load the system config (`-c`, then `MCJOB_CONFIG`, then the user config dir)
/// and the workspace's job record.
pub fn load_inputs(
    explicit_config: Option<PathBuf>,
    layout: &WorkspaceLayout,
) -> Result<(SystemConfig, JobRecord), StartupError> {
    let path = resolve_config_path(explicit_config.or_else(crate::env::config_path))?;
    let config = SystemConfig::load(&path)?;
    let record = JobRecord::load(&layout.record_path())?;
    if record.id != layout.job_id {
        return Err(StartupError::Arguments(format!(
            "record {} does not belong to workspace {}",
            record.id,
            layout.root.display()
        )));
    }
    Ok((config, record))
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
