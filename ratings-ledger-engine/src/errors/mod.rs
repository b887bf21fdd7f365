mod activity;
mod ledger;
mod notification;
mod service;

pub use activity::ActivityError;
pub use ledger::LedgerError;
pub use notification::NotificationError;
pub use service::ServiceError;
