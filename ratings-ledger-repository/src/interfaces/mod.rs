//! This module defines and re-exports the interfaces for the ratings repository.
//! It serves as a central point for accessing traits related to data interaction.
mod activity;
mod content;
mod ledger;
mod users;

pub use activity::ActivityRepository;
pub use content::ContentRepository;
pub use ledger::{LedgerRepository, LedgerTransaction};
pub use users::UserDirectory;
