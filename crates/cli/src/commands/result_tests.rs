// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::commands::submit::submit_plan;
use crate::commands::test_context::TestEnv;
use mc_core::status_file::write_status;
use mc_core::test_support::{phantom_plan, proton_beam};
use mc_core::{FakeClock, FinishReason, Status, StatusArtifact, WorkspaceLayout};
use mc_engine::monitor::Aggregator;
use mc_engine::test_support::RecordingAggregator;
use mc_engine::JobError;

#[tokio::test]
async fn unfinished_job_is_not_ready() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    let report = submit_plan(&ctx, &plan, FakeClock::new()).await.unwrap();
    let args = ResultArgs {
        id: report.submission.record.id.to_string(),
        out: None,
    };

    let err = handle(args, &ctx, OutputFormat::Text).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobError>(),
        Some(JobError::NotReady { .. })
    ));
}

#[tokio::test]
async fn finished_job_is_extracted() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    let record = submit_plan(&ctx, &plan, FakeClock::new())
        .await
        .unwrap()
        .submission
        .record;
    let layout = WorkspaceLayout::open(&record.workspace).unwrap();
    RecordingAggregator::new()
        .aggregate(&layout, &record)
        .await
        .unwrap();
    write_status(
        &record.status_path,
        &StatusArtifact::with_reason(Status::Finished, FinishReason::ParticleCount),
    )
    .unwrap();

    let out = env.root().join("delivery");
    let args = ResultArgs {
        id: record.id.to_string(),
        out: Some(out.clone()),
    };
    handle(args, &ctx, OutputFormat::Json).unwrap();

    assert!(out.join("report.cfg").is_file());
    assert!(out.join("idc-PHANTOM-water_box-Test_Plan-PLAN.dcm").is_file());
}

#[test]
fn unknown_job_is_not_found() {
    let env = TestEnv::new();
    let ctx = env.context();
    let args = ResultArgs {
        id: "nobody_plan_1".to_string(),
        out: None,
    };

    let err = handle(args, &ctx, OutputFormat::Text).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobError>(),
        Some(JobError::NotFound(_))
    ));
}
