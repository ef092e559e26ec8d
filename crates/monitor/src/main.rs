// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mcjob-monitor
//!
//! Long-lived process bound to one job workspace. It polls the scheduler and
//! the compute tasks' progress reports, applies the stopping criteria and
//! writes the job's status artifact until the job is terminal.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod env;
mod startup;

use args::MonitorArgs;
use clap::Parser;
use mc_adapters::{CondorScheduler, TracedScheduler};
use mc_core::SystemClock;
use mc_engine::monitor::lock_holder;
use mc_engine::{JobControlMonitor, MonitorConfig, SchedulerAggregator};
use startup::StartupError;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = MonitorArgs::parse();
    let policy = args.policy().map_err(StartupError::Arguments)?;

    let layout = startup::open_workspace(&args.workspace)?;
    let log_guard = startup::setup_logging(&layout, args.daemon)?;

    let lock_path = layout.monitor_lock_path();
    let _lock = match startup::acquire_lock(&lock_path) {
        Ok(lock) => lock,
        Err(StartupError::LockFailed(_)) => {
            eprintln!("mcjob-monitor is already running for {}", layout.root.display());
            if let Some(pid) = lock_holder(&lock_path) {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let (config, record) = match startup::load_inputs(args.config.clone(), &layout) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!(workspace = %layout.root.display(), error = %e, "monitor failed to start");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut monitor_config =
        MonitorConfig::new(policy, &config.monitor).with_keep_intermediates(config.identity.debug);
    if let Some(poll) = args.poll_interval() {
        monitor_config = monitor_config.with_poll_interval(poll);
    }

    info!(
        job_id = %record.id,
        user = %args.user,
        min_particles = policy.min_particles,
        uncertainty_goal = policy.uncertainty_goal,
        timeout_secs = policy.timeout.as_secs(),
        "starting job-control monitor"
    );

    let scheduler = TracedScheduler::new(CondorScheduler::new().with_timeout(config.command_timeout()));
    let aggregator = SchedulerAggregator::new(
        scheduler.clone(),
        monitor_config.poll_interval,
        config.monitor.aggregation_timeout(),
    );
    let mut monitor = JobControlMonitor::new(
        layout,
        record,
        scheduler,
        aggregator,
        SystemClock,
        monitor_config,
    );
    let status = monitor.run().await;
    info!(%status, "monitor stopped");

    drop(log_guard);
    Ok(())
}
