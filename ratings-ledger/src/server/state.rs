use ratings_ledger_engine::{ChannelHub, RatingsService};

use crate::config::Dependencies;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: RatingsService,
    /// In-process notification hub, absent when a remote relay is used.
    pub hub: Option<ChannelHub>,
}

impl From<Dependencies> for AppState {
    fn from(dependencies: Dependencies) -> Self {
        Self {
            service: dependencies.service,
            hub: dependencies.hub,
        }
    }
}
