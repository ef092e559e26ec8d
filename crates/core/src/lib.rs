// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mc-core: domain types for Monte Carlo dose-job orchestration

pub mod clock;
pub mod config;
pub mod id;
pub mod job_spec;
pub mod plan;
pub mod record;
pub mod status;
pub mod status_file;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use config::{ConfigError, SystemConfig};
pub use id::{sanitize_name, BeamId, JobId, PlanId};
pub use job_spec::JobSpec;
pub use plan::{Beam, GeometryMode, PlanDetails, PlanError, RadiationClass, StoppingCriteria};
pub use record::{JobRecord, RecordError};
pub use status::{FinishReason, Status, StatusError};
pub use status_file::{StatusArtifact, StatusFileError};
pub use workspace::WorkspaceLayout;
