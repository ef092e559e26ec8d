//! Result bundles

use crate::prelude::*;
use mc_core::test_support::{phantom_plan, proton_beam};
use mc_core::Status;
use mc_engine::{JobError, ResultBundle};

#[tokio::test]
async fn result_of_an_unfinished_job_is_not_ready() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;

    let err = spec.registry.result(&job.record.id).unwrap_err();
    assert!(matches!(
        err,
        JobError::NotReady {
            status: Status::Submitted,
            ..
        }
    ));
}

#[tokio::test]
async fn repeated_results_are_identical() {
    let spec = Spec::new();
    let job = spec.submit(&phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")])).await;
    tasks_active(&spec, &job, 4);
    job.report("task.0", 10_000, None);
    assert_eq!(spec.monitor(&job).run().await, Status::Finished);

    let first = spec.registry.result(&job.record.id).unwrap();
    let second = spec.registry.result(&job.record.id).unwrap();

    assert_eq!(first, second);
    let stored = std::fs::read(job.staged.layout.bundle_path()).unwrap();
    assert_eq!(ResultBundle::decode(&stored).unwrap(), first);
    let names: Vec<&str> = first.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["idc-PHANTOM-water_box-Test_Plan-PLAN.dcm", "report.cfg"]);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let spec = Spec::new();
    let err = spec
        .registry
        .result(&mc_core::JobId::new("nobody_plan_1"))
        .unwrap_err();
    assert!(matches!(err, JobError::NotFound(_)));
}
