//! HTTP API tests over in-memory storage and in-process notifications.
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use ratings_ledger::config::{AppConfig, LogFormat, NotificationBackend, StorageBackend};
use ratings_ledger::server::{create_app, state::AppState};
use ratings_ledger::Dependencies;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn config(notification: NotificationBackend) -> AppConfig {
    AppConfig {
        storage: StorageBackend::Memory,
        notification,
        server_addr: "127.0.0.1:0".parse().unwrap(),
        notify_timeout: Duration::from_millis(200),
        log_format: LogFormat::Pretty,
    }
}

async fn app_with(notification: NotificationBackend) -> Router {
    let dependencies = Dependencies::new(&config(notification)).await.unwrap();
    create_app(AppState::from(dependencies))
}

async fn app() -> Router {
    app_with(NotificationBackend::InProcess).await
}

fn request(method: &str, uri: &str, caller: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-user-id", caller.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn create_rating(app: &Router, owner: Uuid, title: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/ratings",
            Some(owner),
            Some(json!({ "title": title, "score": 8, "tags": ["Food"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_caller_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(
        &app,
        request("POST", "/ratings", None, Some(json!({ "title": "x", "score": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(&app, request("GET", "/activities", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vote_round_trip() {
    let app = app().await;
    let owner = Uuid::new_v4();
    let voter = Uuid::new_v4();
    let rating_id = create_rating(&app, owner, "Night market").await;

    let vote = |intent: &str| {
        request(
            "POST",
            "/votes",
            Some(voter),
            Some(json!({ "entityId": rating_id, "entityType": "RATING", "vote": intent })),
        )
    };

    let (status, body) = send(&app, vote("UP")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "upvotesCount": 1, "downvotesCount": 0, "vote": "UP" })
    );

    let (_, body) = send(&app, vote("DOWN")).await;
    assert_eq!(
        body,
        json!({ "upvotesCount": 0, "downvotesCount": 1, "vote": "DOWN" })
    );

    let uri = format!("/votes?entityId={rating_id}&entityType=RATING");
    let (status, body) = send(&app, request("GET", &uri, Some(voter), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vote"], "DOWN");

    let (_, body) = send(&app, vote("REMOVE")).await;
    assert_eq!(
        body,
        json!({ "upvotesCount": 0, "downvotesCount": 0, "vote": "NONE" })
    );

    // Two vote activities: the upvote and the switch. Removal emits none.
    let (_, body) = send(
        &app,
        request("GET", "/activities/unread-count", Some(owner), None),
    )
    .await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_vote_errors() {
    let app = app().await;
    let owner = Uuid::new_v4();
    let rating_id = create_rating(&app, owner, "Own work").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/votes",
            Some(owner),
            Some(json!({ "entityId": rating_id, "entityType": "RATING", "vote": "UP" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "self_vote");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/votes",
            Some(Uuid::new_v4()),
            Some(json!({ "entityId": Uuid::new_v4(), "entityType": "COMMENT", "vote": "UP" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "entity_not_found");
}

#[tokio::test]
async fn test_invalid_rating_is_bad_request() {
    let app = app().await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(Uuid::new_v4()),
            Some(json!({ "title": "Too good", "score": 11 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_comment_and_activity_flow() {
    let app = app().await;
    let owner = Uuid::new_v4();
    let commenter = Uuid::new_v4();
    let rating_id = create_rating(&app, owner, "Lakeside cafe").await;

    let (status, comment) = send(
        &app,
        request(
            "POST",
            &format!("/ratings/{rating_id}/comments"),
            Some(commenter),
            Some(json!({ "body": "The croissants are great" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let (status, page) = send(
        &app,
        request("GET", &format!("/ratings/{rating_id}/comments"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (_, page) = send(&app, request("GET", "/activities", Some(owner), None)).await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["activityType"], "COMMENT_CREATE");
    assert_eq!(items[0]["targetRatingId"], rating_id.as_str());
    assert_eq!(items[0]["isRead"], false);
    let activity_id = items[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/activities/{activity_id}/read"),
            Some(owner),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], true);

    let (_, body) = send(
        &app,
        request("GET", "/activities/unread-count", Some(owner), None),
    )
    .await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/comments/{comment_id}"), Some(owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "not_comment_author");

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/comments/{comment_id}"),
            Some(commenter),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, page) = send(&app, request("GET", "/activities", Some(owner), None)).await;
    assert!(page["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_all_read() {
    let app = app().await;
    let owner = Uuid::new_v4();
    let rating_id = create_rating(&app, owner, "Bookshop").await;
    for _ in 0..3 {
        send(
            &app,
            request(
                "POST",
                "/votes",
                Some(Uuid::new_v4()),
                Some(json!({ "entityId": rating_id, "entityType": "RATING", "vote": "UP" })),
            ),
        )
        .await;
    }

    let (status, body) = send(&app, request("POST", "/activities/read", Some(owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 3);

    let (_, body) = send(&app, request("POST", "/activities/read", Some(owner), None)).await;
    assert_eq!(body["updated"], 0);
}

#[tokio::test]
async fn test_feed_pages_and_tag_filter() {
    let app = app().await;
    let owner = Uuid::new_v4();
    for title in ["One", "Two", "Three"] {
        create_rating(&app, owner, title).await;
    }

    let (status, page) = send(&app, request("GET", "/feed?limit=2", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    let cursor = page["nextCursor"].as_str().unwrap().replace('|', "%7C");

    let (_, page) = send(
        &app,
        request("GET", &format!("/feed?limit=2&cursor={cursor}"), None, None),
    )
    .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert!(page.get("nextCursor").is_none());

    let (_, page) = send(&app, request("GET", "/feed?tag=FOOD", None, None)).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
    let (_, page) = send(&app, request("GET", "/feed?tag=travel", None, None)).await;
    assert!(page["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comments_of_unknown_rating_not_found() {
    let app = app().await;
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/ratings/{}/comments", Uuid::new_v4()),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activity_stream_opens_event_stream() {
    let app = app().await;
    let response = app
        .oneshot(request(
            "GET",
            "/activities/stream",
            Some(Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
}

#[tokio::test]
async fn test_activity_stream_requires_in_process_hub() {
    let app = app_with(NotificationBackend::Http {
        relay_url: "http://127.0.0.1:9".to_string(),
    })
    .await;
    let (status, body) = send(
        &app,
        request("GET", "/activities/stream", Some(Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unavailable");
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let app = app().await;
    let owner = Uuid::new_v4();
    let rating_id = create_rating(&app, owner, "Corner bakery").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/votes",
            Some(Uuid::new_v4()),
            Some(json!({ "entityId": rating_id, "entityType": "RATING", "vote": "SIDEWAYS" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, body) = send(&app, request("GET", "/feed?limit=-1", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, body) = send(
        &app,
        request("DELETE", "/comments/not-a-uuid", Some(owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/ratings/{rating_id}/comments"),
            Some(owner),
            Some(json!({ "text": "missing body field" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}
