//! This module defines the `RatingsService`, the transaction wrapper that ties
//! the ledger, the activity log and notifications together.
//!
//! Every mutating operation follows the same shape: begin a ledger
//! transaction, apply the business rules through it, commit, and only then hand
//! the recipients of recorded activities to the notification dispatcher. A
//! business-rule error rolls the transaction back; a notification failure never
//! reaches the caller.
use std::sync::Arc;

use ratings_ledger_repository::{
    ActivityRepository, ContentRepository, LedgerRepository, LedgerTransaction, UserDirectory,
};
use ratings_ledger_shared::types::{
    Activity, ActivityId, ActivityView, Comment, EntityId, EntityType, NewComment, NewRating,
    Rating, UserId, VoteIntent, VoteOutcome, VoteState, now,
};
use ratings_ledger_shared::{CursorPaginator, Page};
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity::{self, ActivityRecorder};
use crate::errors::{LedgerError, ServiceError};
use crate::ledger::{VoteCommand, VoteLedger, VoteReceipt};
use crate::notifier::NotificationDispatcher;

/// Highest score a rating can carry.
pub const MAX_SCORE: i16 = 10;

/// Commits or rolls back `tx` depending on `result`.
async fn finish<T>(
    tx: Box<dyn LedgerTransaction>,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(%error, %rollback_error, "Failed to roll back ledger transaction");
            }
            Err(error)
        }
    }
}

fn not_found(entity_type: EntityType, entity_id: EntityId) -> ServiceError {
    LedgerError::EntityNotFound {
        entity_type,
        entity_id,
    }
    .into()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Orchestrates the ratings platform's mutating and list operations.
#[derive(Clone)]
pub struct RatingsService {
    ledger_repository: Arc<dyn LedgerRepository>,
    content: Arc<dyn ContentRepository>,
    activities: ActivityRecorder,
    ledger: VoteLedger,
    dispatcher: NotificationDispatcher,
    paginator: CursorPaginator,
}

impl RatingsService {
    /// Creates a new `RatingsService`.
    ///
    /// # Arguments
    ///
    /// * `ledger_repository` - Opens the transactions every mutation runs in
    /// * `content` - Read side of ratings, comments and votes
    /// * `activities` - Read side of the activity log
    /// * `users` - Display info lookup for activity actors
    /// * `dispatcher` - Post-commit notification dispatch
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepository>,
        content: Arc<dyn ContentRepository>,
        activities: Arc<dyn ActivityRepository>,
        users: Arc<dyn UserDirectory>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            ledger_repository,
            content,
            activities: ActivityRecorder::new(activities, users),
            ledger: VoteLedger::new(),
            dispatcher,
            paginator: CursorPaginator::default(),
        }
    }

    /// Builds a service over one repository implementing every storage trait.
    pub fn from_repository<R>(repository: Arc<R>, dispatcher: NotificationDispatcher) -> Self
    where
        R: LedgerRepository + ContentRepository + ActivityRepository + UserDirectory + 'static,
    {
        Self::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository,
            dispatcher,
        )
    }

    fn notify(&self, activity: Option<&Activity>) {
        if let Some(activity) = activity {
            self.dispatcher.dispatch(activity.recipient_user_id);
        }
    }

    /// Applies a vote and returns the updated counters and the caller's vote.
    pub async fn vote(
        &self,
        voter_id: UserId,
        entity_type: EntityType,
        entity_id: EntityId,
        intent: VoteIntent,
    ) -> Result<VoteOutcome, ServiceError> {
        let command = VoteCommand {
            entity_id,
            entity_type,
            voter_id,
            intent,
        };

        let mut tx = self.ledger_repository.begin().await?;
        let result = self.vote_in(tx.as_mut(), &command).await;
        let (receipt, activity) = finish(tx, result).await?;

        info!(
            entity_type = entity_type.as_str(),
            %entity_id,
            %voter_id,
            transition = ?receipt.transition,
            upvotes = receipt.counts.upvotes,
            downvotes = receipt.counts.downvotes,
            "Vote committed"
        );
        self.notify(activity.as_ref());
        Ok(receipt.outcome())
    }

    /// The caller's current vote on an entity.
    pub async fn user_vote(
        &self,
        user_id: UserId,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<VoteState, ServiceError> {
        let vote = self
            .content
            .get_vote(entity_type, entity_id, user_id)
            .await?;
        Ok(VoteState::from(vote.map(|vote| vote.vote_type)))
    }

    /// Publishes a rating to the feed.
    ///
    /// # Errors
    ///
    /// * `ServiceError::Validation` - Blank title or score outside `0..=10`
    pub async fn create_rating(
        &self,
        author_id: UserId,
        new_rating: NewRating,
    ) -> Result<Rating, ServiceError> {
        let title = new_rating.title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("title must not be empty".to_string()));
        }
        if !(0..=MAX_SCORE).contains(&new_rating.score) {
            return Err(ServiceError::Validation(format!(
                "score must be between 0 and {MAX_SCORE}"
            )));
        }

        let rating = Rating {
            id: Uuid::new_v4(),
            user_id: author_id,
            title: title.to_string(),
            score: new_rating.score,
            body: new_rating.body.trim().to_string(),
            tags: normalize_tags(new_rating.tags),
            upvotes_count: 0,
            downvotes_count: 0,
            comments_count: 0,
            created_at: now(),
            deleted_at: None,
        };
        self.content.insert_rating(&rating).await?;
        info!(rating_id = %rating.id, %author_id, "Rating created");
        Ok(rating)
    }

    /// Adds a comment to a rating and notifies the rating owner.
    ///
    /// The comment, the rating's `comments_count` and the `COMMENT_CREATE`
    /// activity commit together.
    pub async fn create_comment(
        &self,
        author_id: UserId,
        rating_id: EntityId,
        new_comment: NewComment,
    ) -> Result<Comment, ServiceError> {
        let body = new_comment.body.trim();
        if body.is_empty() {
            return Err(ServiceError::Validation(
                "comment body must not be empty".to_string(),
            ));
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            rating_id,
            user_id: author_id,
            body: body.to_string(),
            upvotes_count: 0,
            downvotes_count: 0,
            created_at: now(),
            deleted_at: None,
        };

        let mut tx = self.ledger_repository.begin().await?;
        let result = self.create_comment_in(tx.as_mut(), &comment).await;
        let activity = finish(tx, result).await?;

        info!(comment_id = %comment.id, %rating_id, %author_id, "Comment created");
        self.notify(activity.as_ref());
        Ok(comment)
    }

    /// Soft-deletes a comment written by the caller.
    ///
    /// Decrements the rating's `comments_count` and soft-deletes every activity
    /// pointing at the comment in the same transaction.
    pub async fn delete_comment(
        &self,
        caller_id: UserId,
        comment_id: EntityId,
    ) -> Result<(), ServiceError> {
        let mut tx = self.ledger_repository.begin().await?;
        let result = self.delete_comment_in(tx.as_mut(), caller_id, comment_id).await;
        let hidden = finish(tx, result).await?;

        info!(%comment_id, %caller_id, hidden_activities = hidden, "Comment deleted");
        Ok(())
    }

    async fn vote_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        command: &VoteCommand,
    ) -> Result<(VoteReceipt, Option<Activity>), ServiceError> {
        let receipt = self.ledger.apply_vote(tx, command).await?;
        let activity = match receipt.activity() {
            Some(activity) => self.activities.record(tx, activity).await?,
            None => None,
        };
        Ok((receipt, activity))
    }

    async fn create_comment_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        comment: &Comment,
    ) -> Result<Option<Activity>, ServiceError> {
        let rating = match tx.lock_votable(EntityType::Rating, comment.rating_id).await? {
            Some(rating) if !rating.deleted => rating,
            _ => return Err(not_found(EntityType::Rating, comment.rating_id)),
        };
        tx.insert_comment(comment).await?;
        tx.adjust_comments_count(comment.rating_id, 1).await?;
        let activity = self
            .activities
            .record(tx, activity::comment_created(comment, rating.owner_id))
            .await?;
        Ok(activity)
    }

    async fn delete_comment_in(
        &self,
        tx: &mut dyn LedgerTransaction,
        caller_id: UserId,
        comment_id: EntityId,
    ) -> Result<u64, ServiceError> {
        let comment = tx
            .lock_votable(EntityType::Comment, comment_id)
            .await?
            .ok_or_else(|| not_found(EntityType::Comment, comment_id))?;
        if comment.owner_id != caller_id {
            return Err(ServiceError::NotCommentAuthor {
                comment_id,
                caller_id,
            });
        }
        if !tx.soft_delete_comment(comment_id, now()).await? {
            return Err(not_found(EntityType::Comment, comment_id));
        }
        tx.adjust_comments_count(comment.rating_id, -1).await?;
        Ok(self
            .activities
            .soft_delete_for_entity(tx, EntityType::Comment, comment_id)
            .await?)
    }

    /// Live ratings, newest first, optionally restricted to one tag.
    pub async fn feed(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Page<Rating>, ServiceError> {
        let request = self.paginator.request(limit, cursor);
        let tag = tag.map(|tag| tag.trim().to_lowercase());
        let rows = self.content.list_feed(&request, tag.as_deref()).await?;
        Ok(self
            .paginator
            .paginate(rows, &request, |rating| (rating.created_at, rating.id)))
    }

    /// Live comments of a live rating, newest first.
    pub async fn comments(
        &self,
        rating_id: EntityId,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<Page<Comment>, ServiceError> {
        match self.content.get_rating(rating_id).await? {
            Some(rating) if rating.deleted_at.is_none() => {}
            _ => return Err(not_found(EntityType::Rating, rating_id)),
        }

        let request = self.paginator.request(limit, cursor);
        let rows = self.content.list_comments(rating_id, &request).await?;
        Ok(self
            .paginator
            .paginate(rows, &request, |comment| (comment.created_at, comment.id)))
    }

    pub async fn activities(
        &self,
        user_id: UserId,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<Page<ActivityView>, ServiceError> {
        Ok(self.activities.list(user_id, limit, cursor).await?)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, ServiceError> {
        Ok(self.activities.unread_count(user_id).await?)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, ServiceError> {
        Ok(self.activities.mark_all_read(user_id).await?)
    }

    pub async fn mark_one_read(
        &self,
        user_id: UserId,
        activity_id: ActivityId,
    ) -> Result<bool, ServiceError> {
        Ok(self.activities.mark_one_read(user_id, activity_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " Coffee ".to_string(),
            "coffee".to_string(),
            String::new(),
            "Berlin".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["coffee", "berlin"]);
    }
}
