// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

const ALL: [Status; 6] = [
    Status::Created,
    Status::Submitted,
    Status::Running,
    Status::Finished,
    Status::Failed,
    Status::Cancelled,
];

fn rank(s: Status) -> u8 {
    match s {
        Status::Created => 0,
        Status::Submitted => 1,
        Status::Running => 2,
        Status::Finished | Status::Failed | Status::Cancelled => 3,
    }
}

#[yare::parameterized(
    created_submitted   = { Status::Created,   Status::Submitted, true },
    submitted_running   = { Status::Submitted, Status::Running,   true },
    running_finished    = { Status::Running,   Status::Finished,  true },
    running_cancelled   = { Status::Running,   Status::Cancelled, true },
    submitted_cancelled = { Status::Submitted, Status::Cancelled, true },
    created_failed      = { Status::Created,   Status::Failed,    true },
    created_running     = { Status::Created,   Status::Running,   false },
    submitted_finished  = { Status::Submitted, Status::Finished,  false },
    running_submitted   = { Status::Running,   Status::Submitted, false },
    finished_cancelled  = { Status::Finished,  Status::Cancelled, false },
    cancelled_running   = { Status::Cancelled, Status::Running,   false },
    running_running     = { Status::Running,   Status::Running,   false },
)]
fn transitions(from: Status, to: Status, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
    assert_eq!(from.transition(to).is_ok(), allowed);
}

#[test]
fn invalid_transition_names_both_ends() {
    let err = Status::Finished.transition(Status::Running).unwrap_err();
    assert_eq!(err.to_string(), "invalid status transition FINISHED -> RUNNING");
}

#[test]
fn status_serializes_in_upper_case() {
    assert_eq!(
        serde_json::to_string(&Status::Cancelled).unwrap(),
        "\"CANCELLED\""
    );
    let parsed: Status = serde_json::from_str("\"RUNNING\"").unwrap();
    assert_eq!(parsed, Status::Running);
}

#[test]
fn status_round_trips_through_from_str() {
    for s in ALL {
        assert_eq!(s.as_str().parse::<Status>().unwrap(), s);
    }
    assert_eq!("finished".parse::<Status>().unwrap(), Status::Finished);
    assert!(matches!(
        "DONE".parse::<Status>(),
        Err(StatusError::Unknown(_))
    ));
}

proptest! {
    #[test]
    fn status_only_moves_forward(path in prop::collection::vec(0usize..6, 0..20)) {
        let mut current = Status::Created;
        for idx in path {
            let next = ALL[idx];
            if let Ok(moved) = current.transition(next) {
                prop_assert!(rank(moved) > rank(current));
                current = moved;
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing(idx in 0usize..6) {
        for terminal in [Status::Finished, Status::Failed, Status::Cancelled] {
            prop_assert!(terminal.transition(ALL[idx]).is_err());
        }
    }
}
