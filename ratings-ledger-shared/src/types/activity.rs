use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, EntityId, EntityType, InvalidCode, UserDisplay, UserId};

/// Kind of event an activity describes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    RatingVote,
    CommentVote,
    CommentCreate,
}

impl ActivityType {
    /// The activity emitted for a vote on the given entity type.
    pub fn for_vote_on(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Rating => ActivityType::RatingVote,
            EntityType::Comment => ActivityType::CommentVote,
        }
    }
}

impl From<ActivityType> for i16 {
    fn from(value: ActivityType) -> Self {
        match value {
            ActivityType::RatingVote => 0,
            ActivityType::CommentVote => 1,
            ActivityType::CommentCreate => 2,
        }
    }
}

impl TryFrom<i16> for ActivityType {
    type Error = InvalidCode;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ActivityType::RatingVote),
            1 => Ok(ActivityType::CommentVote),
            2 => Ok(ActivityType::CommentCreate),
            _ => Err(InvalidCode { kind: "activity type", code }),
        }
    }
}

/// An append-only, soft-deletable notification addressed to one user.
///
/// `recipient_user_id` never equals `actor_user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub recipient_user_id: UserId,
    pub actor_user_id: UserId,
    pub activity_type: ActivityType,
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An activity about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub recipient_user_id: UserId,
    pub actor_user_id: UserId,
    pub activity_type: ActivityType,
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub metadata: serde_json::Value,
}

/// An activity as listed to its recipient.
///
/// `target_rating_id` is the rating the activity deep-links to: the entity
/// itself for rating activities, the parent rating for comment activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub target_rating_id: Option<EntityId>,
    pub actor: Option<UserDisplay>,
}
