use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntityId, EntityType, InvalidCode, UserId};

/// Direction of a stored vote.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    /// Indicates an upvote or positive endorsement.
    Up,
    /// Indicates a downvote or negative endorsement.
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }
}

impl From<VoteType> for i16 {
    fn from(value: VoteType) -> Self {
        match value {
            VoteType::Up => 0,
            VoteType::Down => 1,
        }
    }
}

impl TryFrom<i16> for VoteType {
    type Error = InvalidCode;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(VoteType::Up),
            1 => Ok(VoteType::Down),
            _ => Err(InvalidCode { kind: "vote type", code }),
        }
    }
}

/// What a caller asks the ledger to do.
///
/// `None` is the canonical removal request. Re-sending the vote type the
/// caller already holds is accepted as the same removal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteIntent {
    Up,
    Down,
    #[serde(alias = "REMOVE")]
    None,
}

impl From<VoteType> for VoteIntent {
    fn from(value: VoteType) -> Self {
        match value {
            VoteType::Up => VoteIntent::Up,
            VoteType::Down => VoteIntent::Down,
        }
    }
}

/// The caller's vote on an entity after an operation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteState {
    Up,
    Down,
    None,
}

impl From<Option<VoteType>> for VoteState {
    fn from(value: Option<VoteType>) -> Self {
        match value {
            Some(VoteType::Up) => VoteState::Up,
            Some(VoteType::Down) => VoteState::Down,
            None => VoteState::None,
        }
    }
}

/// One ledger row: a user's vote on a rating or a comment.
///
/// At most one exists per `(entity_type, entity_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub user_id: UserId,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}
