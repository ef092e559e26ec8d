//! Job-control monitor: stopping criteria and forward-only status

use crate::prelude::*;
use mc_adapters::{SchedulerCall, WorkflowState};
use mc_core::test_support::{phantom_plan, proton_beam};
use mc_core::{FinishReason, Status, StatusArtifact, StoppingCriteria};
use mc_engine::PollOutcome;
use std::time::Duration;

fn particle_plan() -> mc_core::PlanDetails {
    let mut plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL"), proton_beam("b2", 2, "IR2HBL")]);
    plan.stopping = StoppingCriteria {
        min_particles: 10_000,
        uncertainty_goal: 0.0,
        timeout_secs: 3600,
    };
    plan
}

#[tokio::test]
async fn particle_count_reached_before_timeout_finishes_the_job() {
    let spec = Spec::new();
    let job = spec.submit(&particle_plan()).await;
    tasks_active(&spec, &job, 8);
    let mut monitor = spec.monitor(&job);

    job.report("task.0", 3_000, None);
    assert_eq!(monitor.poll_once().await.unwrap(), PollOutcome::Continue);
    assert_eq!(job.status().status, Status::Running);

    spec.clock.advance(Duration::from_secs(600));
    job.report("task.0", 6_000, None);
    job.report("task.1", 4_000, None);
    let status = monitor.run().await;

    assert_eq!(status, Status::Finished);
    assert_eq!(
        job.status(),
        StatusArtifact::with_reason(Status::Finished, FinishReason::ParticleCount)
    );
    assert!(job.staged.layout.stop_marker().exists());
    assert_eq!(spec.aggregator.calls(), 1);
}

#[tokio::test]
async fn timeout_finishes_the_job_when_particles_fall_short() {
    let spec = Spec::new();
    let job = spec.submit(&particle_plan()).await;
    tasks_active(&spec, &job, 8);
    job.report("task.0", 500, None);
    let mut monitor = spec.monitor(&job);

    assert_eq!(monitor.poll_once().await.unwrap(), PollOutcome::Continue);
    spec.clock.advance(Duration::from_secs(3600));

    assert_eq!(monitor.run().await, Status::Finished);
    assert_eq!(job.status().reason, Some(FinishReason::Timeout));
}

#[tokio::test]
async fn finished_job_is_never_reentered() {
    let spec = Spec::new();
    let job = spec.submit(&particle_plan()).await;
    tasks_active(&spec, &job, 8);
    job.report("task.0", 10_000, None);
    let mut monitor = spec.monitor(&job);
    assert_eq!(monitor.run().await, Status::Finished);

    // Compute tasks keep reporting and the scheduler later flags a failure
    job.report("task.1", 50_000, None);
    spec.scheduler.set_state(&job.handle(), WorkflowState::failed());

    assert_eq!(
        monitor.poll_once().await.unwrap(),
        PollOutcome::Exit(Status::Finished)
    );
    assert_eq!(monitor.trigger(FinishReason::Timeout).await.unwrap(), Status::Finished);
    assert_eq!(
        job.status(),
        StatusArtifact::with_reason(Status::Finished, FinishReason::ParticleCount)
    );
    assert_eq!(spec.aggregator.calls(), 1);
}

#[tokio::test]
async fn restarted_monitor_does_not_aggregate_twice() {
    let spec = Spec::new();
    let job = spec.submit(&particle_plan()).await;
    tasks_active(&spec, &job, 8);
    job.report("task.0", 10_000, None);

    assert_eq!(spec.monitor(&job).run().await, Status::Finished);
    assert_eq!(spec.monitor(&job).run().await, Status::Finished);

    assert_eq!(spec.aggregator.calls(), 1);
}

#[tokio::test]
async fn failed_workflow_fails_the_job() {
    let spec = Spec::new();
    let job = spec.submit(&particle_plan()).await;
    tasks_active(&spec, &job, 8);
    let mut monitor = spec.monitor(&job);
    assert_eq!(monitor.poll_once().await.unwrap(), PollOutcome::Continue);

    spec.scheduler.set_state(&job.handle(), WorkflowState::failed());

    assert_eq!(monitor.run().await, Status::Failed);
    assert_eq!(job.status().reason, Some(FinishReason::SchedulerFailure));
    assert_eq!(spec.aggregator.calls(), 0);
    assert!(spec
        .scheduler
        .calls()
        .iter()
        .any(|c| matches!(c, SchedulerCall::Query { .. })));
}
