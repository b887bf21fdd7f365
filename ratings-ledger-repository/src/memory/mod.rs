//! In-process implementation of the ratings ledger repository.
//!
//! Backs development runs without a database and the engine's test suite.
//! A ledger transaction takes the store's mutex for its whole lifetime and
//! writes in place, keeping an undo log of the rows it touched: `commit`
//! forgets the log, dropping or rolling back replays it. Transactions are
//! therefore serialized, which is a coarser version of the row locks the
//! PostgreSQL backend takes.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratings_ledger_shared::pagination::newest_first;
use ratings_ledger_shared::types::{
    Activity, ActivityId, ActivityView, Comment, EntityId, EntityType, Rating, UserDisplay,
    UserId, VotableRef, Vote, VoteType, VotesCount, VotesDelta,
};
use ratings_ledger_shared::PageRequest;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    ActivityRepository, ContentRepository, LedgerRepository, LedgerTransaction, RepositoryError,
    UserDirectory,
};

type VoteKey = (EntityType, EntityId, UserId);

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, UserDisplay>,
    ratings: HashMap<EntityId, Rating>,
    comments: HashMap<EntityId, Comment>,
    votes: HashMap<VoteKey, Vote>,
    activities: HashMap<ActivityId, Activity>,
}

impl MemoryState {
    fn counters_mut(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Option<(&mut i64, &mut i64)> {
        match entity_type {
            EntityType::Rating => self
                .ratings
                .get_mut(&entity_id)
                .map(|r| (&mut r.upvotes_count, &mut r.downvotes_count)),
            EntityType::Comment => self
                .comments
                .get_mut(&entity_id)
                .map(|c| (&mut c.upvotes_count, &mut c.downvotes_count)),
        }
    }

    fn target_rating_id(&self, activity: &Activity) -> Option<EntityId> {
        match activity.entity_type {
            EntityType::Rating => Some(activity.entity_id),
            EntityType::Comment => self
                .comments
                .get(&activity.entity_id)
                .map(|comment| comment.rating_id),
        }
    }
}

/// Memory-backed repository implementing every repository trait.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatingsRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRatingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every vote row currently stored for an entity.
    pub async fn votes_for(&self, entity_type: EntityType, entity_id: EntityId) -> Vec<Vote> {
        let state = self.state.lock().await;
        state
            .votes
            .values()
            .filter(|vote| vote.entity_type == entity_type && vote.entity_id == entity_id)
            .cloned()
            .collect()
    }

    /// Every activity addressed to a recipient, soft-deleted ones included,
    /// newest first.
    pub async fn activities_for(&self, recipient_id: UserId) -> Vec<Activity> {
        let state = self.state.lock().await;
        let mut activities: Vec<Activity> = state
            .activities
            .values()
            .filter(|activity| activity.recipient_user_id == recipient_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| newest_first((&a.created_at, &a.id), (&b.created_at, &b.id)));
        activities
    }

    /// Total number of stored activities, whoever they are addressed to.
    pub async fn activity_count(&self) -> usize {
        self.state.lock().await.activities.len()
    }
}

/// Prior version of a row touched by a transaction; `None` means it did not exist.
#[derive(Debug)]
enum Undo {
    Vote(VoteKey, Option<Vote>),
    Rating(EntityId, Option<Rating>),
    Comment(EntityId, Option<Comment>),
    Activity(ActivityId, Option<Activity>),
}

fn restore<K, V>(table: &mut HashMap<K, V>, key: K, prior: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match prior {
        Some(row) => {
            table.insert(key, row);
        }
        None => {
            table.remove(&key);
        }
    }
}

/// A ledger unit of work over the in-memory state.
///
/// Writes go straight to the locked state. Each row is saved to the undo log
/// before its first change, and the log is replayed in reverse unless the
/// transaction commits.
pub struct InMemoryLedgerTransaction {
    state: OwnedMutexGuard<MemoryState>,
    undo: Vec<Undo>,
}

impl InMemoryLedgerTransaction {
    fn remember_vote(&mut self, key: VoteKey) {
        let prior = self.state.votes.get(&key).cloned();
        self.undo.push(Undo::Vote(key, prior));
    }

    fn remember_rating(&mut self, rating_id: EntityId) {
        let prior = self.state.ratings.get(&rating_id).cloned();
        self.undo.push(Undo::Rating(rating_id, prior));
    }

    fn remember_comment(&mut self, comment_id: EntityId) {
        let prior = self.state.comments.get(&comment_id).cloned();
        self.undo.push(Undo::Comment(comment_id, prior));
    }

    fn remember_activity(&mut self, activity_id: ActivityId) {
        let prior = self.state.activities.get(&activity_id).cloned();
        self.undo.push(Undo::Activity(activity_id, prior));
    }

    fn remember_counters(&mut self, entity_type: EntityType, entity_id: EntityId) {
        match entity_type {
            EntityType::Rating => self.remember_rating(entity_id),
            EntityType::Comment => self.remember_comment(entity_id),
        }
    }

    fn undo_all(&mut self) {
        while let Some(entry) = self.undo.pop() {
            let state = &mut *self.state;
            match entry {
                Undo::Vote(key, prior) => restore(&mut state.votes, key, prior),
                Undo::Rating(id, prior) => restore(&mut state.ratings, id, prior),
                Undo::Comment(id, prior) => restore(&mut state.comments, id, prior),
                Undo::Activity(id, prior) => restore(&mut state.activities, id, prior),
            }
        }
    }
}

impl Drop for InMemoryLedgerTransaction {
    fn drop(&mut self) {
        self.undo_all();
    }
}

#[async_trait]
impl LedgerRepository for InMemoryRatingsRepository {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, RepositoryError> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryLedgerTransaction {
            state,
            undo: Vec::new(),
        }))
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryLedgerTransaction {
    async fn lock_votable(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<Option<VotableRef>, RepositoryError> {
        let state = &*self.state;
        let votable = match entity_type {
            EntityType::Rating => state.ratings.get(&entity_id).map(|rating| VotableRef {
                entity_id,
                entity_type,
                owner_id: rating.user_id,
                rating_id: rating.id,
                deleted: rating.deleted_at.is_some(),
            }),
            EntityType::Comment => state.comments.get(&entity_id).map(|comment| {
                let rating_deleted = state
                    .ratings
                    .get(&comment.rating_id)
                    .is_none_or(|rating| rating.deleted_at.is_some());
                VotableRef {
                    entity_id,
                    entity_type,
                    owner_id: comment.user_id,
                    rating_id: comment.rating_id,
                    deleted: comment.deleted_at.is_some() || rating_deleted,
                }
            }),
        };
        Ok(votable)
    }

    async fn find_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<Option<Vote>, RepositoryError> {
        Ok(self
            .state
            .votes
            .get(&(entity_type, entity_id, user_id))
            .cloned())
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError> {
        let key = (vote.entity_type, vote.entity_id, vote.user_id);
        self.remember_vote(key);
        self.state.votes.insert(key, vote.clone());
        Ok(())
    }

    async fn update_vote_type(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
        vote_type: VoteType,
        voted_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let key = (entity_type, entity_id, user_id);
        if !self.state.votes.contains_key(&key) {
            return Ok(());
        }
        self.remember_vote(key);
        if let Some(vote) = self.state.votes.get_mut(&key) {
            vote.vote_type = vote_type;
            vote.created_at = voted_at;
        }
        Ok(())
    }

    async fn delete_vote(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let key = (entity_type, entity_id, user_id);
        self.remember_vote(key);
        self.state.votes.remove(&key);
        Ok(())
    }

    async fn apply_votes_delta(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        delta: VotesDelta,
    ) -> Result<VotesCount, RepositoryError> {
        self.remember_counters(entity_type, entity_id);
        let (upvotes, downvotes) = self
            .state
            .counters_mut(entity_type, entity_id)
            .ok_or_else(|| {
                RepositoryError::MissingRow(format!("{} {}", entity_type.as_str(), entity_id))
            })?;
        *upvotes = (*upvotes + delta.upvotes).max(0);
        *downvotes = (*downvotes + delta.downvotes).max(0);
        Ok(VotesCount {
            entity_id,
            entity_type,
            upvotes: *upvotes,
            downvotes: *downvotes,
        })
    }

    async fn insert_activity(&mut self, activity: &Activity) -> Result<(), RepositoryError> {
        self.remember_activity(activity.id);
        self.state.activities.insert(activity.id, activity.clone());
        Ok(())
    }

    async fn soft_delete_activities_for_entity(
        &mut self,
        entity_type: EntityType,
        entity_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let targets: Vec<ActivityId> = self
            .state
            .activities
            .values()
            .filter(|activity| {
                activity.entity_type == entity_type
                    && activity.entity_id == entity_id
                    && activity.deleted_at.is_none()
            })
            .map(|activity| activity.id)
            .collect();

        for activity_id in &targets {
            self.remember_activity(*activity_id);
            if let Some(activity) = self.state.activities.get_mut(activity_id) {
                activity.deleted_at = Some(deleted_at);
            }
        }
        Ok(targets.len() as u64)
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<(), RepositoryError> {
        self.remember_comment(comment.id);
        self.state.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn soft_delete_comment(
        &mut self,
        comment_id: EntityId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let live = self
            .state
            .comments
            .get(&comment_id)
            .is_some_and(|comment| comment.deleted_at.is_none());
        if !live {
            return Ok(false);
        }
        self.remember_comment(comment_id);
        if let Some(comment) = self.state.comments.get_mut(&comment_id) {
            comment.deleted_at = Some(deleted_at);
        }
        Ok(true)
    }

    async fn adjust_comments_count(
        &mut self,
        rating_id: EntityId,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        self.remember_rating(rating_id);
        let rating = self
            .state
            .ratings
            .get_mut(&rating_id)
            .ok_or_else(|| RepositoryError::MissingRow(format!("rating {}", rating_id)))?;
        rating.comments_count = (rating.comments_count + delta).max(0);
        Ok(rating.comments_count)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut tx = self;
        tx.undo.clear();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut tx = self;
        tx.undo_all();
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRatingsRepository {
    async fn list_activities(
        &self,
        recipient_id: UserId,
        request: &PageRequest,
    ) -> Result<Vec<ActivityView>, RepositoryError> {
        let state = self.state.lock().await;
        let mut activities: Vec<&Activity> = state
            .activities
            .values()
            .filter(|activity| {
                activity.recipient_user_id == recipient_id
                    && activity.deleted_at.is_none()
                    && request.filter.admits(&activity.created_at, &activity.id)
            })
            .collect();
        activities.sort_by(|a, b| newest_first((&a.created_at, &a.id), (&b.created_at, &b.id)));

        Ok(activities
            .into_iter()
            .take(request.fetch_limit())
            .map(|activity| ActivityView {
                target_rating_id: state.target_rating_id(activity),
                activity: activity.clone(),
                actor: None,
            })
            .collect())
    }

    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for activity in state.activities.values_mut() {
            if activity.recipient_user_id == recipient_id
                && !activity.is_read
                && activity.deleted_at.is_none()
            {
                activity.is_read = true;
                activity.read_at = Some(read_at);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_one_read(
        &self,
        recipient_id: UserId,
        activity_id: ActivityId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(activity) = state.activities.get_mut(&activity_id).filter(|activity| {
            activity.recipient_user_id == recipient_id && activity.deleted_at.is_none()
        }) else {
            return Ok(None);
        };

        if activity.is_read {
            return Ok(Some(false));
        }
        activity.is_read = true;
        activity.read_at = Some(read_at);
        Ok(Some(true))
    }

    async fn unread_count(&self, recipient_id: UserId) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        let count = state
            .activities
            .values()
            .filter(|activity| {
                activity.recipient_user_id == recipient_id
                    && !activity.is_read
                    && activity.deleted_at.is_none()
            })
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl ContentRepository for InMemoryRatingsRepository {
    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .await
            .ratings
            .insert(rating.id, rating.clone());
        Ok(())
    }

    async fn get_rating(&self, rating_id: EntityId) -> Result<Option<Rating>, RepositoryError> {
        Ok(self.state.lock().await.ratings.get(&rating_id).cloned())
    }

    async fn get_comment(&self, comment_id: EntityId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.state.lock().await.comments.get(&comment_id).cloned())
    }

    async fn list_feed(
        &self,
        request: &PageRequest,
        tag: Option<&str>,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let state = self.state.lock().await;
        let mut ratings: Vec<&Rating> = state
            .ratings
            .values()
            .filter(|rating| {
                rating.deleted_at.is_none()
                    && tag.is_none_or(|tag| rating.tags.iter().any(|t| t == tag))
                    && request.filter.admits(&rating.created_at, &rating.id)
            })
            .collect();
        ratings.sort_by(|a, b| newest_first((&a.created_at, &a.id), (&b.created_at, &b.id)));
        Ok(ratings
            .into_iter()
            .take(request.fetch_limit())
            .cloned()
            .collect())
    }

    async fn list_comments(
        &self,
        rating_id: EntityId,
        request: &PageRequest,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let state = self.state.lock().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|comment| {
                comment.rating_id == rating_id
                    && comment.deleted_at.is_none()
                    && request.filter.admits(&comment.created_at, &comment.id)
            })
            .collect();
        comments.sort_by(|a, b| newest_first((&a.created_at, &a.id), (&b.created_at, &b.id)));
        Ok(comments
            .into_iter()
            .take(request.fetch_limit())
            .cloned()
            .collect())
    }

    async fn get_vote(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Result<Option<Vote>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .get(&(entity_type, entity_id, user_id))
            .cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryRatingsRepository {
    async fn display_info(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, UserDisplay>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|user| (*id, user.clone())))
            .collect())
    }

    async fn upsert_user(&self, user: &UserDisplay) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .await
            .users
            .insert(user.user_id, user.clone());
        Ok(())
    }
}
