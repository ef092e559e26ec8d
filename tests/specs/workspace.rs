//! Workspace allocation

use crate::prelude::*;
use mc_core::test_support::{phantom_plan, proton_beam};
use mc_engine::WorkspaceBuilder;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn indices_increase_per_user_and_plan() {
    let spec = Spec::new();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);

    let first = spec.stage(&plan).layout;
    let second = spec.stage(&plan).layout;

    assert_eq!(first.index, 1);
    assert_eq!(second.index, 2);
    assert_ne!(first.job_id, second.job_id);
    assert_eq!(first.root.parent(), second.root.parent());
}

#[test]
fn concurrent_builders_never_share_an_index() {
    let spec = Spec::new();
    let plan = phantom_plan(vec![proton_beam("b1", 1, "IR2HBL")]);
    let config = Arc::clone(&spec.stage(&plan).config);

    let indices: Vec<u32> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let builder = WorkspaceBuilder::new(Arc::clone(&config));
                let plan = &plan;
                s.spawn(move || builder.create(plan).unwrap().index)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<u32> = indices.iter().copied().collect();
    assert_eq!(unique.len(), 4);
    assert!(indices.iter().all(|i| (2..=5).contains(i)));
}
