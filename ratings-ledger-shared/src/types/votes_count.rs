use serde::{Deserialize, Serialize};

use crate::types::{EntityId, EntityType, VoteState};

/// Represents the aggregated vote counts for a rating or a comment.
///
/// This is the denormalized projection of the vote ledger stored on the
/// entity row itself. Both counters are never negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VotesCount {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Relative change applied to a counter projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VotesDelta {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VotesDelta {
    pub fn is_zero(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }
}

/// Result of applying a vote, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub upvotes_count: i64,
    pub downvotes_count: i64,
    pub vote: VoteState,
}
