//! HTTP server setup and routing.
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tracing::info;

use self::extract::CALLER_HEADER;
use self::state::AppState;

/// Creates the CORS layer for local frontend development.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CALLER_HEADER)])
}

/// Creates the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/votes", get(handlers::user_vote).post(handlers::vote))
        .route("/ratings", post(handlers::create_rating))
        .route("/feed", get(handlers::feed))
        .route(
            "/ratings/:id/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/comments/:id", delete(handlers::delete_comment))
        .route("/activities", get(handlers::list_activities))
        .route("/activities/unread-count", get(handlers::unread_count))
        .route("/activities/read", post(handlers::mark_all_read))
        .route("/activities/:id/read", post(handlers::mark_one_read))
        .route("/activities/stream", get(handlers::activity_stream))
        .layer(create_cors_layer())
        .with_state(state)
}

/// Runs the server on the specified address until ctrl-c.
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;
    Ok(())
}
