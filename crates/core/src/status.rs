// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status state machine.
//!
//! `Created → Submitted → Running → {Finished | Failed | Cancelled}`.
//! `Failed` and `Cancelled` may also be entered from `Created` or `Submitted`;
//! `Finished` is only reachable from `Running`. Terminal states are final.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from status transitions and parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("unknown status: {0}")]
    Unknown(String),
}

/// Lifecycle status of a job attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Created,
    Submitted,
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished | Status::Failed | Status::Cancelled)
    }

    /// Whether `self -> next` is an allowed forward move.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        match (self, next) {
            (Created, Submitted) => true,
            (Submitted, Running) => true,
            (Running, Finished) => true,
            (Created | Submitted | Running, Failed | Cancelled) => true,
            _ => false,
        }
    }

    /// Validate and perform a transition.
    pub fn transition(self, next: Status) -> Result<Status, StatusError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Created => "CREATED",
            Status::Submitted => "SUBMITTED",
            Status::Running => "RUNNING",
            Status::Finished => "FINISHED",
            Status::Failed => "FAILED",
            Status::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Status::Created),
            "SUBMITTED" => Ok(Status::Submitted),
            "RUNNING" => Ok(Status::Running),
            "FINISHED" => Ok(Status::Finished),
            "FAILED" => Ok(Status::Failed),
            "CANCELLED" => Ok(Status::Cancelled),
            other => Err(StatusError::Unknown(other.to_string())),
        }
    }
}

/// Why a job reached a terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Simulated particle count reached the minimum
    ParticleCount,
    /// Estimated uncertainty reached the goal
    UncertaintyGoal,
    /// Per-task wall-time limit elapsed
    Timeout,
    /// Compute stage ended on its own
    Completed,
    SoftCancel,
    HardCancel,
    /// Scheduler reported the workflow failed or removed
    SchedulerFailure,
    AggregationFailure,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinishReason::ParticleCount => "particle_count",
            FinishReason::UncertaintyGoal => "uncertainty_goal",
            FinishReason::Timeout => "timeout",
            FinishReason::Completed => "completed",
            FinishReason::SoftCancel => "soft_cancel",
            FinishReason::HardCancel => "hard_cancel",
            FinishReason::SchedulerFailure => "scheduler_failure",
            FinishReason::AggregationFailure => "aggregation_failure",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
