// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command line of `mcjob-monitor`

use clap::Parser;
use mc_engine::StopPolicy;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "mcjob-monitor",
    version,
    about = "Job-control monitor for one Monte Carlo dose-calculation workspace"
)]
pub struct MonitorArgs {
    /// Account the scheduler calls run as
    #[arg(short = 'l', long = "user")]
    pub user: String,

    /// Per-task wall-time limit in seconds (0 disables)
    #[arg(short = 't', long = "timeout", default_value_t = 0)]
    pub timeout_secs: u64,

    /// Stop once this many primaries were simulated (0 disables)
    #[arg(short = 'n', long = "min-particles", default_value_t = 0)]
    pub min_particles: u64,

    /// Stop once the mean relative uncertainty (percent) is at or below this (0 disables)
    #[arg(short = 'u', long = "uncertainty", default_value_t = 0.0)]
    pub uncertainty_goal: f64,

    /// Seconds between polls
    #[arg(short = 'p', long = "poll")]
    pub poll_interval_secs: Option<u64>,

    /// Workspace to monitor
    #[arg(short = 'w', long = "workspace")]
    pub workspace: PathBuf,

    /// Daemon mode: log to `logs/monitor.log` in the workspace
    #[arg(short = 'd', long = "daemon")]
    pub daemon: bool,

    /// System config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

impl MonitorArgs {
    /// Thresholds from `-n`, `-u` and `-t`.
    pub fn policy(&self) -> Result<StopPolicy, String> {
        if !self.uncertainty_goal.is_finite() || self.uncertainty_goal < 0.0 {
            return Err(format!(
                "uncertainty goal must be a non-negative number, got {}",
                self.uncertainty_goal
            ));
        }
        if self.min_particles == 0 && self.uncertainty_goal == 0.0 {
            return Err("one of -n or -u must be greater than zero".to_string());
        }
        Ok(StopPolicy {
            min_particles: self.min_particles,
            uncertainty_goal: self.uncertainty_goal,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
