//! Status transitions and validation of queue items and decisions.

use serde::Serialize;

use goldrec_types::RecordId;

use crate::error::{QueueError, QueueResult};
use crate::item::{QueueDecision, QueueItem, QueueStatus};

/// Fails unless `to` is reachable from `from` in one step.
pub fn validate_status_transition(from: QueueStatus, to: QueueStatus) -> QueueResult<()> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    Err(QueueError::InvalidStatusTransition {
        from,
        to,
        allowed: from.allowed_transitions().to_vec(),
    })
}

/// Checks a decision on its own: a selected match for `confirm` and `merge`,
/// and a confidence within `[0, 1]`.
pub fn validate_decision(decision: &QueueDecision) -> QueueResult<()> {
    if decision.action.requires_match() {
        match &decision.selected_match_id {
            None => {
                return Err(QueueError::validation(
                    "selectedMatchId",
                    format!("required for a {} decision", decision.action),
                ));
            }
            Some(id) if id.is_blank() => {
                return Err(QueueError::validation(
                    "selectedMatchId",
                    "must not be blank",
                ));
            }
            Some(_) => {}
        }
    }
    if let Some(confidence) = decision.confidence {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(QueueError::validation(
                "confidence",
                format!("must be within [0, 1], got {confidence}"),
            ));
        }
    }
    Ok(())
}

/// Completeness check for a stored queue item.
///
/// Items decided by a reviewer (`confirmed`, `rejected`, `merged`) must
/// carry both `decision` and `decidedAt`. Expired items are closed by the
/// queue, not by a reviewer, and carry neither.
pub fn validate_queue_item<T>(item: &QueueItem<T>) -> QueueResult<()> {
    if item.id.as_str().trim().is_empty() {
        return Err(QueueError::validation("id", "must not be blank"));
    }
    if item.potential_matches.is_empty() {
        return Err(QueueError::validation(
            "potentialMatches",
            "at least one potential match is required",
        ));
    }
    for (i, m) in item.potential_matches.iter().enumerate() {
        if !m.score.is_finite() || !(0.0..=1.0).contains(&m.score) {
            return Err(QueueError::validation(
                format!("potentialMatches[{i}].score"),
                format!("must be within [0, 1], got {}", m.score),
            ));
        }
    }
    if item.status.requires_decision() {
        let Some(decision) = &item.decision else {
            return Err(QueueError::validation(
                "decision",
                format!("a {} item must carry the decision that closed it", item.status),
            ));
        };
        if decision.action.resulting_status() != item.status {
            return Err(QueueError::validation(
                "decision",
                format!(
                    "a {} decision cannot close an item as {}",
                    decision.action, item.status
                ),
            ));
        }
        if item.decided_at.is_none() {
            return Err(QueueError::validation(
                "decidedAt",
                format!("a {} item must record when it was decided", item.status),
            ));
        }
    }
    Ok(())
}

/// Whether `item` can be merged with the match identified by `match_id`.
///
/// True only for open items whose candidate and selected match both carry
/// an id in `id_field`.
pub fn can_merge<T: Serialize>(item: &QueueItem<T>, match_id: &RecordId, id_field: &str) -> bool {
    matches!(item.status, QueueStatus::Pending | QueueStatus::Reviewing)
        && item.find_match(match_id, id_field).is_some()
        && item.candidate_id(id_field).is_some()
}
