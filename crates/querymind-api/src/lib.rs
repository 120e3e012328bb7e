//! QueryMind API crate - axum HTTP server and route handlers.
//!
//! Exposes the question-answering pipeline over REST: a chat endpoint that
//! runs one question through the engine and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
