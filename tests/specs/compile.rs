//! Plan → job graph → submission descriptor

use crate::prelude::*;
use mc_core::test_support::{ion_beam, phantom_plan, proton_beam};
use mc_core::BeamId;
use mc_engine::SkipReason;

#[tokio::test]
async fn beam_lacking_radiation_data_is_skipped_with_a_warning() {
    let spec = Spec::new();
    let plan = phantom_plan(vec![
        proton_beam("b1", 1, "IR2HBL"),
        ion_beam("b2", 2, "IR2HBL"),
    ]);

    let job = spec.submit(&plan).await;
    let compiled = &job.staged.compiled;

    assert_eq!(compiled.specs.len(), 1);
    assert!(compiled.specs.contains_key(&BeamId::new("b1")));
    assert_eq!(compiled.summary.warnings.len(), 1);
    assert!(compiled.summary.warnings[0].contains("b2"));
    assert!(matches!(
        compiled.summary.skipped[0].reason,
        SkipReason::MissingRadiationData { .. }
    ));

    let submit = job.submit_descriptor();
    let queues = submit.lines().filter(|l| l.starts_with("queue ")).count();
    assert_eq!(queues, 1);
    assert!(submit.contains("# beam 1 (b1)"));
}

#[test]
fn deselected_beams_yield_one_spec_per_remaining_beam() {
    let spec = Spec::new();
    let mut plan = phantom_plan(vec![
        proton_beam("b1", 1, "IR2HBL"),
        proton_beam("b2", 2, "IR2HBL"),
        proton_beam("b3", 3, "IR2VBL"),
        proton_beam("b4", 4, "IR2VBL"),
    ]);
    plan.beams[1].selected = false;
    plan.beams[3].selected = false;

    let staged = spec.stage(&plan);
    let compiled = &staged.compiled;

    let ids: Vec<&str> = compiled.specs.keys().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["b1", "b3"]);
    assert_eq!(compiled.summary.skipped.len(), 2);
    assert!(compiled
        .summary
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::Deselected));
}

#[test]
fn summary_names_plan_user_and_geometry() {
    let spec = Spec::new();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let staged = spec.stage(&plan);
    let text = staged.compiled.summary.to_string();

    assert!(text.starts_with("plan 1.2.826.0.1.3680043.2 for user tester, geometry PHANTOM (water_box)"));
    assert!(text.contains("1 of 1 beams compiled"));
}
