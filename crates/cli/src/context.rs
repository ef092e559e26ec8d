// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation state: the loaded config, the adapters and a registry
//! rebuilt from the persisted job records.

use anyhow::{Context as _, Result};
use mc_adapters::{
    CondorScheduler, LocalProcesses, ProcessAdapter, SchedulerAdapter, TracedProcesses,
    TracedScheduler,
};
use mc_core::config::resolve_config_path;
use mc_core::{JobId, SystemConfig};
use mc_engine::JobRegistry;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Context<S, P> {
    pub config: Arc<SystemConfig>,
    /// Forwarded to monitors so they load the same file
    pub config_path: PathBuf,
    pub scheduler: S,
    pub processes: P,
    pub registry: JobRegistry<S, P>,
}

pub type LiveContext = Context<TracedScheduler<CondorScheduler>, TracedProcesses<LocalProcesses>>;

impl<S, P> Context<S, P>
where
    S: SchedulerAdapter,
    P: ProcessAdapter,
{
    pub fn new(config: SystemConfig, config_path: PathBuf, scheduler: S, processes: P) -> Result<Self> {
        let registry = JobRegistry::new(scheduler.clone(), processes.clone());
        registry
            .recover(&config.paths.jobs_dir)
            .with_context(|| format!("failed to scan {}", config.paths.jobs_dir.display()))?;
        Ok(Self {
            config: Arc::new(config),
            config_path,
            scheduler,
            processes,
            registry,
        })
    }

    pub fn job_id(&self, raw: &str) -> JobId {
        JobId::new(raw.trim())
    }
}

/// Load the config (`--config`, then `MCJOB_CONFIG`, then the user config
/// dir) and wire the HTCondor and local-process adapters.
pub fn load(explicit: Option<PathBuf>) -> Result<LiveContext> {
    let path = resolve_config_path(explicit.or_else(crate::env::config_path))?;
    let config = SystemConfig::load(&path)?;
    let scheduler = TracedScheduler::new(CondorScheduler::new().with_timeout(config.command_timeout()));
    let processes = TracedProcesses::new(LocalProcesses::new());
    Context::new(config, path, scheduler, processes)
}
