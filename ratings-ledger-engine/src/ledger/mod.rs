//! This module defines the vote ledger: the state machine that turns a vote
//! request into a vote-row mutation and a relative counter update, executed
//! inside a caller-provided [`LedgerTransaction`].
//!
//! Ratings and comments share the same transition table.
use ratings_ledger_repository::LedgerTransaction;
use ratings_ledger_shared::types::{
    ActivityType, EntityId, EntityType, NewActivity, UserId, VotableRef, Vote, VoteIntent,
    VoteOutcome, VoteState, VoteType, VotesCount, VotesDelta, now,
};
use serde_json::json;
use tracing::debug;

use crate::errors::LedgerError;

/// The mutation a vote request resolves to, given the voter's existing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No previous vote; a new one is inserted.
    Cast(VoteType),
    /// The existing vote is removed.
    Retract(VoteType),
    /// The existing vote changes direction in place.
    Switch { from: VoteType, to: VoteType },
    /// Removal requested with nothing to remove.
    Unchanged,
}

impl VoteTransition {
    /// Resolves `(existing vote, requested intent)` to a transition.
    ///
    /// Requesting the direction already held is a removal, same as
    /// [`VoteIntent::None`].
    pub fn plan(existing: Option<VoteType>, intent: VoteIntent) -> Self {
        let requested = match intent {
            VoteIntent::Up => Some(VoteType::Up),
            VoteIntent::Down => Some(VoteType::Down),
            VoteIntent::None => None,
        };

        match (existing, requested) {
            (None, None) => VoteTransition::Unchanged,
            (None, Some(to)) => VoteTransition::Cast(to),
            (Some(held), None) => VoteTransition::Retract(held),
            (Some(held), Some(to)) if held == to => VoteTransition::Retract(held),
            (Some(from), Some(to)) => VoteTransition::Switch { from, to },
        }
    }

    /// Counter changes implied by the transition.
    pub fn delta(&self) -> VotesDelta {
        match *self {
            VoteTransition::Cast(vote_type) => unit_delta(vote_type, 1),
            VoteTransition::Retract(vote_type) => unit_delta(vote_type, -1),
            VoteTransition::Switch { from, to } => {
                let removed = unit_delta(from, -1);
                let added = unit_delta(to, 1);
                VotesDelta {
                    upvotes: removed.upvotes + added.upvotes,
                    downvotes: removed.downvotes + added.downvotes,
                }
            }
            VoteTransition::Unchanged => VotesDelta::default(),
        }
    }

    /// The voter's vote once the transition is applied.
    pub fn resulting_vote(&self) -> Option<VoteType> {
        match *self {
            VoteTransition::Cast(vote_type) => Some(vote_type),
            VoteTransition::Switch { to, .. } => Some(to),
            VoteTransition::Retract(_) | VoteTransition::Unchanged => None,
        }
    }

    /// Only new or changed votes notify the entity owner.
    pub fn emits_activity(&self) -> bool {
        matches!(
            self,
            VoteTransition::Cast(_) | VoteTransition::Switch { .. }
        )
    }
}

fn unit_delta(vote_type: VoteType, sign: i64) -> VotesDelta {
    match vote_type {
        VoteType::Up => VotesDelta {
            upvotes: sign,
            downvotes: 0,
        },
        VoteType::Down => VotesDelta {
            upvotes: 0,
            downvotes: sign,
        },
    }
}

/// A vote request from an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCommand {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub voter_id: UserId,
    pub intent: VoteIntent,
}

/// What a successful [`VoteLedger::apply_vote`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    pub target: VotableRef,
    pub voter_id: UserId,
    pub transition: VoteTransition,
    pub counts: VotesCount,
}

impl VoteReceipt {
    /// Counters and the caller's resulting vote state.
    pub fn outcome(&self) -> VoteOutcome {
        VoteOutcome {
            upvotes_count: self.counts.upvotes,
            downvotes_count: self.counts.downvotes,
            vote: VoteState::from(self.transition.resulting_vote()),
        }
    }

    /// The activity owed to the entity owner, if the transition emits one.
    ///
    /// Metadata carries the new direction, the previous one for switches, and
    /// the parent rating for comment votes.
    pub fn activity(&self) -> Option<NewActivity> {
        let vote_type = match self.transition {
            VoteTransition::Cast(vote_type) | VoteTransition::Switch { to: vote_type, .. } => {
                vote_type
            }
            VoteTransition::Retract(_) | VoteTransition::Unchanged => return None,
        };

        let mut metadata = json!({ "vote": vote_type.as_str() });
        if let VoteTransition::Switch { from, .. } = self.transition {
            metadata["previous"] = json!(from.as_str());
        }
        if self.target.entity_type == EntityType::Comment {
            metadata["ratingId"] = json!(self.target.rating_id);
        }

        Some(NewActivity {
            recipient_user_id: self.target.owner_id,
            actor_user_id: self.voter_id,
            activity_type: ActivityType::for_vote_on(self.target.entity_type),
            entity_id: self.target.entity_id,
            entity_type: self.target.entity_type,
            metadata,
        })
    }
}

/// Applies vote transitions and keeps the counter projection in step.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteLedger;

impl VoteLedger {
    pub fn new() -> Self {
        Self
    }

    /// Applies one vote inside `tx`.
    ///
    /// The entity row is locked before the existing vote is read, so concurrent
    /// votes on the same entity serialize. Counters move by a relative delta
    /// evaluated by the store, never by writing back values read here.
    ///
    /// # Errors
    ///
    /// * `LedgerError::EntityNotFound` - The entity does not exist or is soft-deleted
    /// * `LedgerError::SelfVote` - The voter owns the entity; nothing is written
    pub async fn apply_vote(
        &self,
        tx: &mut dyn LedgerTransaction,
        command: &VoteCommand,
    ) -> Result<VoteReceipt, LedgerError> {
        let target = match tx
            .lock_votable(command.entity_type, command.entity_id)
            .await?
        {
            Some(target) if !target.deleted => target,
            _ => {
                return Err(LedgerError::EntityNotFound {
                    entity_type: command.entity_type,
                    entity_id: command.entity_id,
                });
            }
        };

        if target.owner_id == command.voter_id {
            return Err(LedgerError::SelfVote {
                entity_type: command.entity_type,
                entity_id: command.entity_id,
                voter_id: command.voter_id,
            });
        }

        let existing = tx
            .find_vote(command.entity_type, command.entity_id, command.voter_id)
            .await?;
        let transition =
            VoteTransition::plan(existing.as_ref().map(|vote| vote.vote_type), command.intent);

        match transition {
            VoteTransition::Cast(vote_type) => {
                tx.insert_vote(&Vote {
                    entity_id: command.entity_id,
                    entity_type: command.entity_type,
                    user_id: command.voter_id,
                    vote_type,
                    created_at: now(),
                })
                .await?;
            }
            VoteTransition::Retract(_) => {
                tx.delete_vote(command.entity_type, command.entity_id, command.voter_id)
                    .await?;
            }
            VoteTransition::Switch { to, .. } => {
                tx.update_vote_type(
                    command.entity_type,
                    command.entity_id,
                    command.voter_id,
                    to,
                    now(),
                )
                .await?;
            }
            VoteTransition::Unchanged => {}
        }

        let counts = tx
            .apply_votes_delta(command.entity_type, command.entity_id, transition.delta())
            .await?;

        debug!(
            entity_type = command.entity_type.as_str(),
            entity_id = %command.entity_id,
            voter_id = %command.voter_id,
            ?transition,
            upvotes = counts.upvotes,
            downvotes = counts.downvotes,
            "Vote applied"
        );

        Ok(VoteReceipt {
            target,
            voter_id: command.voter_id,
            transition,
            counts,
        })
    }
}
