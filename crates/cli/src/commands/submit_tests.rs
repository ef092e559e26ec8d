// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::commands::test_context::TestEnv;
use mc_adapters::ProcessCall;
use mc_core::test_support::{ion_beam, phantom_plan, proton_beam};
use mc_core::{BeamId, FakeClock, Status};

#[tokio::test]
async fn submitted_job_is_registered() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let report = submit_plan(&ctx, &plan, FakeClock::new()).await.unwrap();

    let record = &report.submission.record;
    assert_eq!(report.submission.handle, "101");
    assert_eq!(record.status, Status::Submitted);
    assert!(record.workspace.ends_with("run.1"));
    assert_eq!(ctx.registry.status(&record.id).unwrap(), Status::Submitted);
    assert!(report.submission.notes.is_empty());
}

#[tokio::test]
async fn monitor_receives_the_config_path() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    submit_plan(&ctx, &plan, FakeClock::new()).await.unwrap();

    let calls = env.processes.calls();
    let Some(ProcessCall::Spawn(invocation)) = calls.first() else {
        panic!("monitor was not spawned: {:?}", calls);
    };
    assert_eq!(invocation.config, Some(env.root().join("config.toml")));
    assert_eq!(invocation.user, "mcuser");
}

#[tokio::test]
async fn beam_without_radiation_data_is_skipped() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![
        proton_beam("b1", 1, "IR2HBL"),
        ion_beam("b2", 2, "IR2HBL"),
    ]);

    let report = submit_plan(&ctx, &plan, FakeClock::new()).await.unwrap();

    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped[0].beam_id, BeamId::new("b2"));
    assert_eq!(report.summary.warnings.len(), 1);
}

#[tokio::test]
async fn invalid_plan_creates_nothing() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(Vec::new());

    let err = submit_plan(&ctx, &plan, FakeClock::new()).await.err().unwrap();

    assert!(matches!(err, JobError::Validation(_)));
    assert!(!env.root().join("jobs").exists());
    assert!(env.scheduler.calls().is_empty());
}

#[tokio::test]
async fn rejected_submission_is_not_registered() {
    let env = TestEnv::new();
    let ctx = env.context();
    env.scheduler.set_submit_exit_code(1);
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let err = submit_plan(&ctx, &plan, FakeClock::new()).await.err().unwrap();

    assert!(matches!(err, JobError::Scheduler(_)));
    assert!(ctx.registry.list().is_empty());
    assert!(env.processes.calls().is_empty());
}

#[tokio::test]
async fn handle_loads_the_plan_file() {
    let env = TestEnv::new();
    let ctx = env.context();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    let path = env.root().join("plan.json");
    std::fs::write(&path, serde_json::to_string(&plan).unwrap()).unwrap();

    handle(SubmitArgs { plan: path }, &ctx, FakeClock::new(), OutputFormat::Json)
        .await
        .unwrap();

    assert_eq!(ctx.registry.list().len(), 1);
}

#[tokio::test]
async fn missing_plan_file_is_an_error() {
    let env = TestEnv::new();
    let ctx = env.context();

    let result = handle(
        SubmitArgs {
            plan: env.root().join("absent.toml"),
        },
        &ctx,
        FakeClock::new(),
        OutputFormat::Text,
    )
    .await;

    assert!(result.is_err());
    assert!(ctx.registry.list().is_empty());
}
