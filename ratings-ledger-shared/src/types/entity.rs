use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{EntityId, UserId};

/// The two kinds of votable and commentable objects.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Rating,
    Comment,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Rating => "rating",
            EntityType::Comment => "comment",
        }
    }
}

/// Raised when a stored discriminant does not map to a known variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} code: {code}")]
pub struct InvalidCode {
    pub kind: &'static str,
    pub code: i16,
}

impl From<EntityType> for i16 {
    fn from(value: EntityType) -> Self {
        match value {
            EntityType::Rating => 0,
            EntityType::Comment => 1,
        }
    }
}

impl TryFrom<i16> for EntityType {
    type Error = InvalidCode;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EntityType::Rating),
            1 => Ok(EntityType::Comment),
            _ => Err(InvalidCode { kind: "entity type", code }),
        }
    }
}

/// The locked view of a votable entity inside a ledger transaction.
///
/// Carries what the ledger needs to validate a vote (owner, soft-delete state)
/// and what the activity recorder needs to deep-link (the rating a comment
/// belongs to; for a rating this is the rating itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotableRef {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub owner_id: UserId,
    pub rating_id: EntityId,
    pub deleted: bool,
}
