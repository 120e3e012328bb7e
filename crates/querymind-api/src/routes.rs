//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, request tracing, and the endpoint
//! handlers.

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // the chat endpoint is consumed by a browser frontend on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat/query", post(handlers::chat_query))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
