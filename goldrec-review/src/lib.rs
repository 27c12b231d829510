//! Human review queue for ambiguous matches.
//!
//! External scoring produces [`QueueItem`]s pairing a candidate record with
//! scored potential matches. Reviewers move items through a fixed status
//! table (`pending`/`reviewing`, then one terminal status) and
//! [`QueueMergeHandler`] turns a merge decision into an archived,
//! provenance-tracked, reversible merge.
//!
//! The queue holds no locks. Concurrent decisions on the same item must be
//! serialized by the caller; terminal statuses only detect a second
//! decision after the fact.

mod adapter;
mod error;
mod handler;
mod item;
mod queue;
pub mod state;

pub use adapter::{InMemoryQueueAdapter, QueueAdapter};
pub use error::{QueueError, QueueResult};
pub use handler::{DEFAULT_ID_FIELD, QueueMergeHandler, QueueMergeOutcome};
pub use item::{
    DecisionAction, MatchOutcome, PotentialMatch, QueueDecision, QueueItem, QueueItemUpdate,
    QueueStatus, record_id_of,
};
pub use queue::{QueueStats, ReviewQueue};
pub use state::{can_merge, validate_decision, validate_queue_item, validate_status_transition};
