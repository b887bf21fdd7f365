//! # Ratings Ledger Engine
//! This crate holds the transactional core of the ratings platform: the vote
//! ledger and its counter projection, the activity log, best-effort recipient
//! notifications, and the service that commits them together.
pub mod activity;
pub mod ledger;
pub mod notifier;
pub mod service;

pub mod errors;

pub use activity::ActivityRecorder;
pub use ledger::{VoteCommand, VoteLedger, VoteReceipt, VoteTransition};
pub use notifier::{
    ActivitySignal, ChannelHub, HttpNotificationChannel, NotificationChannel,
    NotificationDispatcher,
};
pub use service::RatingsService;
