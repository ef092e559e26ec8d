//! Harness for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use mc_adapters::{FakeProcesses, FakeScheduler, WorkflowState};
use mc_core::status_file::read_status;
use mc_core::{FakeClock, JobRecord, PlanDetails, StatusArtifact};
use mc_engine::test_support::{stage_plan, write_task_stats, RecordingAggregator, StagedPlan};
use mc_engine::{JobControlMonitor, JobRegistry, Launcher, MonitorConfig, StopPolicy};
use std::sync::Arc;
use std::time::Duration;

pub type SpecMonitor = JobControlMonitor<FakeScheduler, RecordingAggregator, FakeClock>;

/// One orchestrator instance over a temporary jobs root
pub struct Spec {
    pub tmp: tempfile::TempDir,
    pub scheduler: FakeScheduler,
    pub processes: FakeProcesses,
    pub clock: FakeClock,
    pub aggregator: RecordingAggregator,
    pub registry: JobRegistry<FakeScheduler, FakeProcesses>,
}

/// A staged, submitted and registered job
pub struct Job {
    pub staged: StagedPlan,
    pub record: JobRecord,
}

impl Spec {
    pub fn new() -> Self {
        let scheduler = FakeScheduler::new();
        let processes = FakeProcesses::new();
        Self {
            tmp: tempfile::tempdir().unwrap(),
            registry: JobRegistry::new(scheduler.clone(), processes.clone()),
            scheduler,
            processes,
            clock: FakeClock::new(),
            aggregator: RecordingAggregator::new(),
        }
    }

    pub fn stage(&self, plan: &PlanDetails) -> StagedPlan {
        stage_plan(self.tmp.path(), plan).unwrap()
    }

    /// Stage, submit and register `plan`
    pub async fn submit(&self, plan: &PlanDetails) -> Job {
        let staged = self.stage(plan);
        let submission = Launcher::new(
            self.scheduler.clone(),
            self.processes.clone(),
            self.clock.clone(),
            Arc::clone(&staged.config),
        )
        .submit(&staged.layout, plan)
        .await
        .unwrap();
        let record = submission.record;
        self.registry
            .register(record.id.clone(), record.clone())
            .unwrap();
        Job { staged, record }
    }

    /// A monitor for `job` with zero poll and drain delays
    pub fn monitor(&self, job: &Job) -> SpecMonitor {
        let config = MonitorConfig {
            policy: StopPolicy::from(&job.record.stopping),
            poll_interval: Duration::ZERO,
            drain_timeout: Duration::ZERO,
            keep_intermediates: false,
        };
        JobControlMonitor::new(
            job.staged.layout.clone(),
            job.record.clone(),
            self.scheduler.clone(),
            self.aggregator.clone(),
            self.clock.clone(),
            config,
        )
    }
}

impl Job {
    pub fn handle(&self) -> String {
        self.record.scheduler_handle.clone().unwrap()
    }

    pub fn status(&self) -> StatusArtifact {
        read_status(&self.record.status_path).unwrap()
    }

    pub fn submit_descriptor(&self) -> String {
        std::fs::read_to_string(self.staged.layout.submit_descriptor_path()).unwrap()
    }

    pub fn report(&self, task: &str, particles: u64, uncertainty: Option<f64>) {
        write_task_stats(&self.staged.layout, task, particles, uncertainty).unwrap();
    }
}

/// Mark `job`'s compute stage as running `n` tasks
pub fn tasks_active(spec: &Spec, job: &Job, n: u32) {
    spec.scheduler.set_state(&job.handle(), WorkflowState::active(n));
}
