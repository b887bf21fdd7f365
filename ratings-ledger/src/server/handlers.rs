//! HTTP request handlers.
use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use ratings_ledger_shared::pagination::Page;
use ratings_ledger_shared::types::{
    ActivityId, ActivityView, Comment, EntityId, EntityType, NewComment, NewRating, Rating,
    VoteIntent, VoteOutcome, VoteState,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info};

use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery, CallerId};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub vote: VoteIntent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteLookup {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
}

#[derive(Debug, Serialize)]
pub struct VoteLookupResponse {
    pub vote: VoteState,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub tag: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Ratings ledger is running")
}

pub async fn vote(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiJson(request): ApiJson<VoteRequest>,
) -> Result<Json<VoteOutcome>, ApiError> {
    let outcome = state
        .service
        .vote(caller, request.entity_type, request.entity_id, request.vote)
        .await?;
    Ok(Json(outcome))
}

pub async fn user_vote(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiQuery(lookup): ApiQuery<VoteLookup>,
) -> Result<Json<VoteLookupResponse>, ApiError> {
    let vote = state
        .service
        .user_vote(caller, lookup.entity_type, lookup.entity_id)
        .await?;
    Ok(Json(VoteLookupResponse { vote }))
}

pub async fn create_rating(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiJson(new_rating): ApiJson<NewRating>,
) -> Result<(StatusCode, Json<Rating>), ApiError> {
    let rating = state.service.create_rating(caller, new_rating).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn feed(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<Page<Rating>>, ApiError> {
    let page = state
        .service
        .feed(query.limit, query.cursor.as_deref(), query.tag.as_deref())
        .await?;
    Ok(Json(page))
}

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(rating_id): ApiPath<EntityId>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<Comment>>, ApiError> {
    let page = state
        .service
        .comments(rating_id, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiPath(rating_id): ApiPath<EntityId>,
    ApiJson(new_comment): ApiJson<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .service
        .create_comment(caller, rating_id, new_comment)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiPath(comment_id): ApiPath<EntityId>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_comment(caller, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_activities(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<ActivityView>>, ApiError> {
    let page = state
        .service
        .activities(caller, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

pub async fn unread_count(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.service.unread_count(caller).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.service.mark_all_read(caller).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn mark_one_read(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    ApiPath(activity_id): ApiPath<ActivityId>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.service.mark_one_read(caller, activity_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Server-sent wake-ups for the caller's activity channel.
///
/// Each event tells the client to re-fetch; a `lagged` event means signals
/// were dropped for this subscriber.
pub async fn activity_stream(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let hub = state
        .hub
        .ok_or(ApiError::Unavailable("activity stream requires in-process notifications"))?;
    let receiver = hub.subscribe(caller).await;
    info!(user_id = %caller, "Activity stream opened");

    let stream = BroadcastStream::new(receiver).map(|signal| {
        let event = match signal {
            Ok(signal) => Event::default()
                .event("activity")
                .json_data(signal)
                .unwrap_or_else(|_| Event::default().event("activity")),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(skipped, "Activity stream subscriber lagged");
                Event::default().event("lagged").data(skipped.to_string())
            }
        };
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
