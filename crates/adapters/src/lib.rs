// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the cluster scheduler and monitor processes

mod env;
pub mod process;
pub mod scheduler;
pub mod subprocess;
pub mod traced;

pub use process::{LocalProcesses, MonitorInvocation, ProcessAdapter, ProcessError};
pub use scheduler::{
    CondorScheduler, SchedulerAdapter, SchedulerError, SubmitOutput, WorkflowState,
};
pub use traced::{TracedProcesses, TracedScheduler};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcesses, ProcessCall};
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::{FakeScheduler, SchedulerCall};
