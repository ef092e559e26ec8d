//! Soft and hard cancellation

use crate::prelude::*;
use mc_adapters::ProcessCall;
use mc_core::test_support::{phantom_plan, proton_beam};
use mc_core::{FinishReason, Status, StatusArtifact};
use mc_engine::test_support::hold_monitor_lock;
use mc_engine::{CancelMode, JobError, PollOutcome};

#[tokio::test]
async fn soft_cancel_takes_effect_at_the_next_poll() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;
    tasks_active(&spec, &job, 4);
    let mut monitor = spec.monitor(&job);
    assert_eq!(monitor.poll_once().await.unwrap(), PollOutcome::Continue);

    let mode = spec.registry.cancel(&job.record.id, CancelMode::Soft).await.unwrap();
    assert_eq!(mode, CancelMode::Soft);
    assert_eq!(spec.registry.status(&job.record.id).unwrap(), Status::Running);

    assert_eq!(
        monitor.poll_once().await.unwrap(),
        PollOutcome::Exit(Status::Cancelled)
    );
    assert_eq!(
        job.status(),
        StatusArtifact::with_reason(Status::Cancelled, FinishReason::SoftCancel)
    );
    assert!(job.staged.layout.stop_marker().exists());
    assert_eq!(spec.aggregator.calls(), 0);
}

#[tokio::test]
async fn hard_cancel_is_immediate() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;
    let pid = job.record.monitor_pid.unwrap();
    let _lock = hold_monitor_lock(&job.staged.layout, pid).unwrap();

    let mode = spec.registry.cancel(&job.record.id, CancelMode::Hard).await.unwrap();

    assert_eq!(mode, CancelMode::Hard);
    assert_eq!(spec.registry.status(&job.record.id).unwrap(), Status::Cancelled);
    assert!(spec.processes.calls().contains(&ProcessCall::Kill { pid }));
    assert_eq!(spec.scheduler.removed(), vec![job.handle()]);
}

#[tokio::test]
async fn cancelled_job_cannot_be_cancelled_again() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;
    spec.registry.cancel(&job.record.id, CancelMode::Hard).await.unwrap();

    let err = spec
        .registry
        .cancel(&job.record.id, CancelMode::Soft)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::AlreadyTerminal { .. }));
}

#[tokio::test]
async fn monitor_exits_after_a_hard_cancel() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;
    spec.registry.cancel(&job.record.id, CancelMode::Hard).await.unwrap();

    assert_eq!(spec.monitor(&job).run().await, Status::Cancelled);
    assert_eq!(job.status().reason, Some(FinishReason::HardCancel));
}
