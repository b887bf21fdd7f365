use std::sync::Arc;
use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use ratings_ledger_engine::{ChannelHub, NotificationDispatcher, RatingsService, VoteTransition};
use ratings_ledger_repository::InMemoryRatingsRepository;
use ratings_ledger_shared::pagination::{Cursor, CursorPaginator};
use ratings_ledger_shared::types::{EntityType, NewRating, VoteIntent, VoteType, now};
use uuid::Uuid;

/// Benchmark planning every (existing vote, intent) pair
fn vote_transition_planning(c: &mut Criterion) {
    let existing = [None, Some(VoteType::Up), Some(VoteType::Down)];
    let intents = [VoteIntent::Up, VoteIntent::Down, VoteIntent::None];

    c.bench_function("plan_vote_transitions", |b| {
        b.iter(|| {
            for current in existing {
                for intent in intents {
                    black_box(VoteTransition::plan(black_box(current), black_box(intent)));
                }
            }
        })
    });
}

/// Benchmark cursor tokens as clients send them back
fn cursor_codec(c: &mut Criterion) {
    let cursor = Cursor::new(now(), Uuid::new_v4());
    let token = cursor.encode();

    c.bench_function("encode_cursor", |b| b.iter(|| black_box(&cursor).encode()));
    c.bench_function("decode_cursor", |b| {
        b.iter(|| Cursor::decode(black_box(&token)))
    });
}

/// Benchmark assembling a page from a limit + 1 fetch
fn page_assembly(c: &mut Criterion) {
    let paginator = CursorPaginator::default();
    let request = paginator.request(Some(50), None);
    let rows: Vec<_> = (0..request.fetch_limit())
        .map(|_| (now(), Uuid::new_v4()))
        .collect();

    c.bench_function("paginate_50_rows", |b| {
        b.iter_batched(
            || rows.clone(),
            |rows| paginator.paginate(rows, &request, |row| *row),
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark a full vote round trip through the service on in-memory storage
fn service_vote_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let hub = ChannelHub::default();
    let dispatcher = NotificationDispatcher::new(Arc::new(hub), Duration::from_secs(1));
    let service = RatingsService::from_repository(
        Arc::new(InMemoryRatingsRepository::new()),
        dispatcher,
    );
    let rating = runtime
        .block_on(service.create_rating(
            Uuid::new_v4(),
            NewRating {
                title: "Benchmark bistro".to_string(),
                score: 9,
                body: String::new(),
                tags: Vec::new(),
            },
        ))
        .unwrap();
    let voter = Uuid::new_v4();

    c.bench_function("service_vote_toggle", |b| {
        b.iter(|| {
            runtime.block_on(async {
                service
                    .vote(voter, EntityType::Rating, rating.id, VoteIntent::Up)
                    .await
                    .unwrap()
            })
        })
    });
}

criterion_group!(
    benches,
    vote_transition_planning,
    cursor_codec,
    page_assembly,
    service_vote_round_trip
);
criterion_main!(benches);
