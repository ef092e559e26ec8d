// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stopping-criteria policy

use super::progress::Progress;
use mc_core::{FinishReason, StoppingCriteria};
use std::time::Duration;

/// Thresholds of one job. A zero threshold disables its criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopPolicy {
    pub min_particles: u64,
    /// Relative uncertainty goal in percent
    pub uncertainty_goal: f64,
    pub timeout: Duration,
}

impl From<&StoppingCriteria> for StopPolicy {
    fn from(criteria: &StoppingCriteria) -> Self {
        Self {
            min_particles: criteria.min_particles,
            uncertainty_goal: criteria.uncertainty_goal,
            timeout: criteria.timeout(),
        }
    }
}

impl StopPolicy {
    /// First satisfied criterion, checked as particles, uncertainty, timeout.
    pub fn evaluate(&self, progress: Option<&Progress>, elapsed: Duration) -> Option<FinishReason> {
        if let Some(progress) = progress {
            if self.min_particles > 0 && progress.particles >= self.min_particles {
                return Some(FinishReason::ParticleCount);
            }
            if self.uncertainty_goal > 0.0
                && progress
                    .uncertainty
                    .is_some_and(|u| u <= self.uncertainty_goal)
            {
                return Some(FinishReason::UncertaintyGoal);
            }
        }
        if !self.timeout.is_zero() && elapsed >= self.timeout {
            return Some(FinishReason::Timeout);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_particles: u64, uncertainty_goal: f64, timeout_secs: u64) -> StopPolicy {
        StopPolicy {
            min_particles,
            uncertainty_goal,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn progress(particles: u64, uncertainty: Option<f64>) -> Progress {
        Progress {
            particles,
            uncertainty,
            tasks: 4,
        }
    }

    #[yare::parameterized(
        below_everything    = { policy(10_000, 2.0, 3600), Some(progress(9_999, Some(2.5))), 3599, None },
        particles_reached   = { policy(10_000, 0.0, 3600), Some(progress(10_000, None)), 10, Some(FinishReason::ParticleCount) },
        uncertainty_reached = { policy(0, 2.0, 3600), Some(progress(50, Some(2.0))), 10, Some(FinishReason::UncertaintyGoal) },
        timeout_reached     = { policy(10_000, 2.0, 3600), Some(progress(1, Some(9.0))), 3600, Some(FinishReason::Timeout) },
        timeout_no_progress = { policy(10_000, 0.0, 60), None, 61, Some(FinishReason::Timeout) },
        particles_win_ties  = { policy(10, 5.0, 60), Some(progress(10, Some(1.0))), 60, Some(FinishReason::ParticleCount) },
        uncertainty_beats_timeout = { policy(1_000, 5.0, 60), Some(progress(10, Some(1.0))), 60, Some(FinishReason::UncertaintyGoal) },
        zero_particles_disabled   = { policy(0, 0.0, 0), Some(progress(u64::MAX, Some(0.0))), 1_000_000, None },
        missing_uncertainty       = { policy(0, 2.0, 0), Some(progress(1, None)), 5, None },
    )]
    fn evaluate(policy: StopPolicy, progress: Option<Progress>, elapsed_secs: u64, expected: Option<FinishReason>) {
        assert_eq!(
            policy.evaluate(progress.as_ref(), Duration::from_secs(elapsed_secs)),
            expected
        );
    }

    #[test]
    fn built_from_plan_criteria() {
        let criteria = StoppingCriteria {
            min_particles: 10_000,
            uncertainty_goal: 0.0,
            timeout_secs: 3600,
        };
        assert_eq!(StopPolicy::from(&criteria), policy(10_000, 0.0, 3600));
    }
}
