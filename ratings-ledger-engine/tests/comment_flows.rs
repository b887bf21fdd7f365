//! Comment creation, deletion and comment votes through `RatingsService`.
mod common;

use common::{harness, post_rating};
use ratings_ledger_engine::errors::{ActivityError, LedgerError, ServiceError};
use ratings_ledger_repository::ContentRepository;
use ratings_ledger_shared::types::{
    ActivityType, EntityType, NewComment, NewRating, VoteIntent, VoteState,
};
use serde_json::json;
use uuid::Uuid;

fn comment(body: &str) -> NewComment {
    NewComment {
        body: body.to_string(),
    }
}

#[tokio::test]
async fn test_comment_notifies_rating_owner() {
    let h = harness();
    let owner = Uuid::new_v4();
    let commenter = Uuid::new_v4();
    let rating = post_rating(&h.service, owner, "Dumpling house").await;

    let created = h
        .service
        .create_comment(commenter, rating.id, comment("  The soup ones are the best  "))
        .await
        .unwrap();
    assert_eq!(created.body, "The soup ones are the best");

    let stored = h.repository.get_rating(rating.id).await.unwrap().unwrap();
    assert_eq!(stored.comments_count, 1);

    let activities = h.service.activities(owner, None, None).await.unwrap();
    assert_eq!(activities.items.len(), 1);
    let view = &activities.items[0];
    assert_eq!(view.activity.activity_type, ActivityType::CommentCreate);
    assert_eq!(view.activity.actor_user_id, commenter);
    assert_eq!(view.target_rating_id, Some(rating.id));
    assert_eq!(
        view.activity.metadata["preview"],
        json!("The soup ones are the best")
    );
}

#[tokio::test]
async fn test_owner_commenting_own_rating_has_no_activity() {
    let h = harness();
    let owner = Uuid::new_v4();
    let rating = post_rating(&h.service, owner, "Corner bookshop").await;

    h.service
        .create_comment(owner, rating.id, comment("Update: they moved next door"))
        .await
        .unwrap();

    assert_eq!(h.repository.activity_count().await, 0);
    let stored = h.repository.get_rating(rating.id).await.unwrap().unwrap();
    assert_eq!(stored.comments_count, 1);
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let h = harness();
    let rating = post_rating(&h.service, Uuid::new_v4(), "Tram line 4").await;

    let result = h
        .service
        .create_comment(Uuid::new_v4(), rating.id, comment("   "))
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_comment_on_missing_rating() {
    let h = harness();
    let result = h
        .service
        .create_comment(Uuid::new_v4(), Uuid::new_v4(), comment("Hello?"))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Ledger(LedgerError::EntityNotFound {
            entity_type: EntityType::Rating,
            ..
        }))
    ));
}

#[tokio::test]
async fn test_only_author_can_delete_comment() {
    let h = harness();
    let owner = Uuid::new_v4();
    let author = Uuid::new_v4();
    let rating = post_rating(&h.service, owner, "Night market").await;
    let created = h
        .service
        .create_comment(author, rating.id, comment("Go early"))
        .await
        .unwrap();

    let result = h.service.delete_comment(owner, created.id).await;
    assert!(matches!(
        result,
        Err(ServiceError::NotCommentAuthor { comment_id, .. }) if comment_id == created.id
    ));
    let stored = h.repository.get_comment(created.id).await.unwrap().unwrap();
    assert!(stored.deleted_at.is_none());
}

#[tokio::test]
async fn test_delete_comment_hides_its_activities() {
    let h = harness();
    let owner = Uuid::new_v4();
    let author = Uuid::new_v4();
    let voter = Uuid::new_v4();
    let rating = post_rating(&h.service, owner, "Lakeside sauna").await;
    let created = h
        .service
        .create_comment(author, rating.id, comment("Bring flip-flops"))
        .await
        .unwrap();
    h.service
        .vote(voter, EntityType::Comment, created.id, VoteIntent::Up)
        .await
        .unwrap();
    assert_eq!(h.service.unread_count(owner).await.unwrap(), 1);
    assert_eq!(h.service.unread_count(author).await.unwrap(), 1);

    h.service.delete_comment(author, created.id).await.unwrap();

    assert_eq!(h.service.unread_count(owner).await.unwrap(), 0);
    assert_eq!(h.service.unread_count(author).await.unwrap(), 0);
    assert!(
        h.service
            .activities(owner, None, None)
            .await
            .unwrap()
            .items
            .is_empty()
    );
    let stored = h.repository.get_rating(rating.id).await.unwrap().unwrap();
    assert_eq!(stored.comments_count, 0);
    assert!(
        h.service
            .comments(rating.id, None, None)
            .await
            .unwrap()
            .items
            .is_empty()
    );

    let again = h.service.delete_comment(author, created.id).await;
    assert!(matches!(
        again,
        Err(ServiceError::Ledger(LedgerError::EntityNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_comment_votes_share_the_transition_table() {
    let h = harness();
    let author = Uuid::new_v4();
    let voter = Uuid::new_v4();
    let rating = post_rating(&h.service, Uuid::new_v4(), "Street tacos").await;
    let created = h
        .service
        .create_comment(author, rating.id, comment("Al pastor, always"))
        .await
        .unwrap();

    let outcome = h
        .service
        .vote(voter, EntityType::Comment, created.id, VoteIntent::Down)
        .await
        .unwrap();
    assert_eq!((outcome.upvotes_count, outcome.downvotes_count), (0, 1));

    let outcome = h
        .service
        .vote(voter, EntityType::Comment, created.id, VoteIntent::Up)
        .await
        .unwrap();
    assert_eq!((outcome.upvotes_count, outcome.downvotes_count), (1, 0));
    assert_eq!(outcome.vote, VoteState::Up);

    let outcome = h
        .service
        .vote(voter, EntityType::Comment, created.id, VoteIntent::None)
        .await
        .unwrap();
    assert_eq!((outcome.upvotes_count, outcome.downvotes_count), (0, 0));

    let activities = h.service.activities(author, None, None).await.unwrap();
    assert_eq!(activities.items.len(), 2);
    for view in &activities.items {
        assert_eq!(view.activity.activity_type, ActivityType::CommentVote);
        assert_eq!(view.target_rating_id, Some(rating.id));
        assert_eq!(view.activity.metadata["ratingId"], json!(rating.id));
    }

    let result = h
        .service
        .vote(author, EntityType::Comment, created.id, VoteIntent::Up)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Ledger(LedgerError::SelfVote { .. }))
    ));
}

#[tokio::test]
async fn test_comments_of_missing_rating() {
    let h = harness();
    let result = h.service.comments(Uuid::new_v4(), None, None).await;
    assert!(matches!(
        result,
        Err(ServiceError::Ledger(LedgerError::EntityNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_comments_are_paginated_newest_first() {
    let h = harness();
    let rating = post_rating(&h.service, Uuid::new_v4(), "Flea market").await;
    let mut created = Vec::new();
    for i in 0..7 {
        created.push(
            h.service
                .create_comment(Uuid::new_v4(), rating.id, comment(&format!("Find #{i}")))
                .await
                .unwrap(),
        );
    }

    let first = h.service.comments(rating.id, Some(4), None).await.unwrap();
    assert_eq!(first.items.len(), 4);
    let second = h
        .service
        .comments(rating.id, Some(4), first.next_cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(second.items.len(), 3);
    assert!(second.next_cursor.is_none());

    let mut listed: Vec<_> = first.items.iter().chain(&second.items).collect();
    listed.sort_by_key(|c| c.id);
    created.sort_by_key(|c| c.id);
    assert_eq!(listed.len(), created.len());
    assert!(listed.iter().zip(&created).all(|(a, b)| a.id == b.id));
}

#[tokio::test]
async fn test_read_state_operations() {
    let h = harness();
    let owner = Uuid::new_v4();
    let rating = post_rating(&h.service, owner, "Observatory").await;
    for _ in 0..3 {
        h.service
            .vote(Uuid::new_v4(), EntityType::Rating, rating.id, VoteIntent::Up)
            .await
            .unwrap();
    }
    assert_eq!(h.service.unread_count(owner).await.unwrap(), 3);

    let page = h.service.activities(owner, None, None).await.unwrap();
    let first_id = page.items[0].activity.id;
    assert!(h.service.mark_one_read(owner, first_id).await.unwrap());
    assert!(!h.service.mark_one_read(owner, first_id).await.unwrap());
    assert_eq!(h.service.unread_count(owner).await.unwrap(), 2);

    assert_eq!(h.service.mark_all_read(owner).await.unwrap(), 2);
    assert_eq!(h.service.unread_count(owner).await.unwrap(), 0);

    let missing = h.service.mark_one_read(owner, Uuid::new_v4()).await;
    assert!(matches!(
        missing,
        Err(ServiceError::Activity(ActivityError::ActivityNotFound(_)))
    ));
}

#[tokio::test]
async fn test_rating_validation() {
    let h = harness();
    let blank_title = h
        .service
        .create_rating(
            Uuid::new_v4(),
            NewRating {
                title: "  ".to_string(),
                score: 5,
                body: String::new(),
                tags: Vec::new(),
            },
        )
        .await;
    assert!(matches!(blank_title, Err(ServiceError::Validation(_))));

    let out_of_range = h
        .service
        .create_rating(
            Uuid::new_v4(),
            NewRating {
                title: "Too good".to_string(),
                score: 11,
                body: String::new(),
                tags: Vec::new(),
            },
        )
        .await;
    assert!(matches!(out_of_range, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_feed_tag_filter_is_case_insensitive() {
    let h = harness();
    let owner = Uuid::new_v4();
    post_rating(&h.service, owner, "Taco truck").await;
    h.service
        .create_rating(
            owner,
            NewRating {
                title: "Ski lodge".to_string(),
                score: 6,
                body: String::new(),
                tags: vec!["Winter".to_string()],
            },
        )
        .await
        .unwrap();

    let page = h.service.feed(None, None, Some("WINTER")).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Ski lodge");
}
