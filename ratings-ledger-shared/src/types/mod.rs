mod activity;
mod content;
mod entity;
mod user;
mod vote;
mod votes_count;

pub use activity::{Activity, ActivityType, ActivityView, NewActivity};
pub use content::{Comment, NewComment, NewRating, Rating};
pub use entity::{EntityType, InvalidCode, VotableRef};
pub use user::UserDisplay;
pub use vote::{Vote, VoteIntent, VoteState, VoteType};
pub use votes_count::{VoteOutcome, VotesCount, VotesDelta};

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Identifier of a platform user.
pub type UserId = Uuid;
/// Identifier of a rating or a comment.
pub type EntityId = Uuid;
/// Identifier of an activity row.
pub type ActivityId = Uuid;

/// Current time truncated to microseconds.
///
/// PostgreSQL `timestamptz` keeps microsecond precision, so every timestamp the
/// system creates is truncated up front. A cursor built from an in-memory value
/// then compares equal to the persisted one.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
