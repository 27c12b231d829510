//! Property-based tests for the queue status table.
//!
//! Verifies that:
//! - a transition succeeds iff the target is in the source's allowed set
//! - terminal statuses reject every transition
//! - every status is reachable from `pending` in at most two steps

use goldrec_review::{QueueStatus, validate_status_transition};
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = QueueStatus> {
    prop::sample::select(QueueStatus::ALL.to_vec())
}

proptest! {
    #[test]
    fn transition_succeeds_iff_allowed(from in arb_status(), to in arb_status()) {
        let allowed = from.allowed_transitions().contains(&to);
        prop_assert_eq!(validate_status_transition(from, to).is_ok(), allowed);
    }

    #[test]
    fn terminal_statuses_are_closed(from in arb_status(), to in arb_status()) {
        if from.is_terminal() {
            prop_assert!(validate_status_transition(from, to).is_err());
        }
    }

    #[test]
    fn self_transitions_never_allowed(status in arb_status()) {
        prop_assert!(validate_status_transition(status, status).is_err());
    }

    #[test]
    fn walks_end_in_terminal_or_open(path in prop::collection::vec(arb_status(), 0..12)) {
        let mut current = QueueStatus::Pending;
        for next in path {
            if validate_status_transition(current, next).is_ok() {
                current = next;
            }
        }
        let open = matches!(current, QueueStatus::Pending | QueueStatus::Reviewing);
        prop_assert_eq!(open, !current.is_terminal());
    }
}

#[test]
fn every_status_reachable_from_pending() {
    for target in QueueStatus::ALL {
        let direct = QueueStatus::Pending.can_transition_to(target);
        let via_review = QueueStatus::Reviewing.can_transition_to(target);
        assert!(target == QueueStatus::Pending || direct || via_review, "{target}");
    }
}
