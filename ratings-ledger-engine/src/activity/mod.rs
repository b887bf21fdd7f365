//! This module defines the `ActivityRecorder`, the single entry point to the
//! append-only activity log: appends inside ledger transactions, recipient
//! listings decorated with actor display info, and read-state updates.
use std::collections::HashSet;
use std::sync::Arc;

use ratings_ledger_repository::{ActivityRepository, LedgerTransaction, UserDirectory};
use ratings_ledger_shared::types::{
    Activity, ActivityId, ActivityType, ActivityView, Comment, EntityId, EntityType, NewActivity,
    UserId, now,
};
use ratings_ledger_shared::{CursorPaginator, Page};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ActivityError;

/// Characters of a comment body kept in a `COMMENT_CREATE` preview.
pub const PREVIEW_CHARS: usize = 140;

/// Builds the `COMMENT_CREATE` activity owed to the owner of a rating.
pub fn comment_created(comment: &Comment, rating_owner_id: UserId) -> NewActivity {
    let preview: String = comment.body.chars().take(PREVIEW_CHARS).collect();
    NewActivity {
        recipient_user_id: rating_owner_id,
        actor_user_id: comment.user_id,
        activity_type: ActivityType::CommentCreate,
        entity_id: comment.id,
        entity_type: EntityType::Comment,
        metadata: json!({ "preview": preview, "ratingId": comment.rating_id }),
    }
}

/// `ActivityRecorder` owns the activity log's rules.
///
/// It never notifies anyone itself; the service signals recipients once the
/// transaction that recorded their activity has committed.
#[derive(Clone)]
pub struct ActivityRecorder {
    activities: Arc<dyn ActivityRepository>,
    users: Arc<dyn UserDirectory>,
    paginator: CursorPaginator,
}

impl ActivityRecorder {
    /// Creates a new `ActivityRecorder`.
    ///
    /// # Arguments
    ///
    /// * `activities` - Read side of the activity log
    /// * `users` - Directory used to decorate listed activities with actor info
    pub fn new(activities: Arc<dyn ActivityRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            activities,
            users,
            paginator: CursorPaginator::default(),
        }
    }

    /// Appends an activity as part of `tx`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Activity))` - The stored activity
    /// * `Ok(None)` - Recipient and actor are the same user; nothing is stored
    pub async fn record(
        &self,
        tx: &mut dyn LedgerTransaction,
        activity: NewActivity,
    ) -> Result<Option<Activity>, ActivityError> {
        if activity.recipient_user_id == activity.actor_user_id {
            debug!(
                user_id = %activity.actor_user_id,
                activity_type = ?activity.activity_type,
                entity_id = %activity.entity_id,
                "Skipping self-notification"
            );
            return Ok(None);
        }

        let activity = Activity {
            id: Uuid::new_v4(),
            recipient_user_id: activity.recipient_user_id,
            actor_user_id: activity.actor_user_id,
            activity_type: activity.activity_type,
            entity_id: activity.entity_id,
            entity_type: activity.entity_type,
            metadata: activity.metadata,
            is_read: false,
            read_at: None,
            created_at: now(),
            deleted_at: None,
        };
        tx.insert_activity(&activity).await?;
        Ok(Some(activity))
    }

    /// Lists a recipient's live activities, newest first.
    ///
    /// Actor display info is resolved in one directory lookup per page. A
    /// failed lookup leaves `actor` empty rather than failing the listing.
    pub async fn list(
        &self,
        recipient_id: UserId,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<Page<ActivityView>, ActivityError> {
        let request = self.paginator.request(limit, cursor);
        let rows = self
            .activities
            .list_activities(recipient_id, &request)
            .await?;
        let mut page = self.paginator.paginate(rows, &request, |view| {
            (view.activity.created_at, view.activity.id)
        });

        let actor_ids: Vec<UserId> = page
            .items
            .iter()
            .map(|view| view.activity.actor_user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if actor_ids.is_empty() {
            return Ok(page);
        }

        match self.users.display_info(&actor_ids).await {
            Ok(actors) => {
                for view in &mut page.items {
                    view.actor = actors.get(&view.activity.actor_user_id).cloned();
                }
            }
            Err(error) => {
                warn!(%recipient_id, %error, "Failed to resolve activity actors");
            }
        }
        Ok(page)
    }

    /// Marks every unread activity of the recipient as read.
    ///
    /// # Returns
    ///
    /// The number of activities that changed state.
    pub async fn mark_all_read(&self, recipient_id: UserId) -> Result<u64, ActivityError> {
        Ok(self.activities.mark_all_read(recipient_id, now()).await?)
    }

    /// Marks one activity of the recipient as read.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The activity was unread and is now read
    /// * `Ok(false)` - It was already read; `read_at` is left untouched
    /// * `Err(ActivityError::ActivityNotFound)` - Missing, deleted or not the recipient's
    pub async fn mark_one_read(
        &self,
        recipient_id: UserId,
        activity_id: ActivityId,
    ) -> Result<bool, ActivityError> {
        self.activities
            .mark_one_read(recipient_id, activity_id, now())
            .await?
            .ok_or(ActivityError::ActivityNotFound(activity_id))
    }

    pub async fn unread_count(&self, recipient_id: UserId) -> Result<i64, ActivityError> {
        Ok(self.activities.unread_count(recipient_id).await?)
    }

    /// Soft-deletes every activity pointing at an entity, as part of `tx`.
    pub async fn soft_delete_for_entity(
        &self,
        tx: &mut dyn LedgerTransaction,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> Result<u64, ActivityError> {
        Ok(tx
            .soft_delete_activities_for_entity(entity_type, entity_id, now())
            .await?)
    }
}
