#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ratings_ledger_engine::{ChannelHub, NotificationDispatcher, RatingsService};
use ratings_ledger_repository::InMemoryRatingsRepository;
use ratings_ledger_shared::types::{NewRating, Rating, UserId};

pub struct Harness {
    pub repository: InMemoryRatingsRepository,
    pub hub: ChannelHub,
    pub service: RatingsService,
}

pub fn harness() -> Harness {
    let repository = InMemoryRatingsRepository::new();
    let hub = ChannelHub::default();
    let dispatcher = NotificationDispatcher::new(Arc::new(hub.clone()), Duration::from_secs(1));
    let service = RatingsService::from_repository(Arc::new(repository.clone()), dispatcher);
    Harness {
        repository,
        hub,
        service,
    }
}

pub async fn post_rating(service: &RatingsService, owner: UserId, title: &str) -> Rating {
    service
        .create_rating(
            owner,
            NewRating {
                title: title.to_string(),
                score: 7,
                body: "Would go again.".to_string(),
                tags: vec!["food".to_string()],
            },
        )
        .await
        .unwrap()
}
