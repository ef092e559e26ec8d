// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! mc-engine: job orchestration from plan to result bundle

pub mod beamline;
pub mod bundle;
pub mod compiler;
pub mod descriptor;
mod error;
mod fsutil;
pub mod launcher;
pub mod monitor;
pub mod registry;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use beamline::{BeamlineCatalog, BeamlineModel, DirectoryCatalog};
pub use bundle::{BundleEntry, ResultBundle};
pub use compiler::{CompileSummary, CompiledPlan, JobGraphCompiler, SkipReason, SkippedBeam};
pub use descriptor::{DescriptorPaths, SubmitDescriptor, SubmitDescriptorWriter, TaskEntry, WorkflowDescriptor};
pub use error::JobError;
pub use launcher::{Launcher, Submission};
pub use monitor::{
    Aggregator, JobControlMonitor, MonitorConfig, PollOutcome, SchedulerAggregator, StopPolicy,
};
pub use registry::{CancelMode, JobRegistry};
pub use workspace::WorkspaceBuilder;
