//! Row shapes read back from PostgreSQL and their conversion to domain types.
use chrono::{DateTime, Utc};
use ratings_ledger_shared::types::{
    Activity, ActivityView, Comment, EntityType, Rating, UserDisplay, Vote,
};
use uuid::Uuid;

use crate::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
pub(super) struct VotableRow {
    pub user_id: Uuid,
    pub rating_id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct VoteRow {
    pub entity_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: i16,
    pub created_at: DateTime<Utc>,
}

impl VoteRow {
    pub fn into_vote(self, entity_type: EntityType) -> Result<Vote, RepositoryError> {
        Ok(Vote {
            entity_id: self.entity_id,
            entity_type,
            user_id: self.user_id,
            vote_type: self.vote_type.try_into()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RatingRow {
    pub id: Uuid,
    pub user_id: Uuid,
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

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            score: row.score,
            body: row.body,
            tags: row.tags,
            upvotes_count: row.upvotes_count,
            downvotes_count: row.downvotes_count,
            comments_count: row.comments_count,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CommentRow {
    pub id: Uuid,
    pub rating_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub upvotes_count: i64,
    pub downvotes_count: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            rating_id: row.rating_id,
            user_id: row.user_id,
            body: row.body,
            upvotes_count: row.upvotes_count,
            downvotes_count: row.downvotes_count,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ActivityRow {
    pub id: Uuid,
    pub recipient_user_id: Uuid,
    pub actor_user_id: Uuid,
    pub activity_type: i16,
    pub entity_id: Uuid,
    pub entity_type: i16,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub target_rating_id: Option<Uuid>,
}

impl TryFrom<ActivityRow> for ActivityView {
    type Error = RepositoryError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityView {
            activity: Activity {
                id: row.id,
                recipient_user_id: row.recipient_user_id,
                actor_user_id: row.actor_user_id,
                activity_type: row.activity_type.try_into()?,
                entity_id: row.entity_id,
                entity_type: row.entity_type.try_into()?,
                metadata: row.metadata,
                is_read: row.is_read,
                read_at: row.read_at,
                created_at: row.created_at,
                deleted_at: row.deleted_at,
            },
            target_rating_id: row.target_rating_id,
            actor: None,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub avatar_url: Option<String>,
}

impl From<UserRow> for UserDisplay {
    fn from(row: UserRow) -> Self {
        UserDisplay {
            user_id: row.id,
            name: row.name,
            handle: row.handle,
            avatar_url: row.avatar_url,
        }
    }
}
