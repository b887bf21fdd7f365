use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntityId, UserId};

/// A scored review of an arbitrary item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: EntityId,
    pub user_id: UserId,
    pub title: String,
    pub score: i16,
    pub body: String,
    pub tags: Vec<String>,
    pub upvotes_count: i64,
    pub downvotes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A comment left on a rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub rating_id: EntityId,
    pub user_id: UserId,
    pub body: String,
    pub upvotes_count: i64,
    pub downvotes_count: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRating {
    pub title: String,
    pub score: i16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub body: String,
}
