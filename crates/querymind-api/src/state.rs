//! Application state shared across all route handlers.
//!
//! AppState holds the pipeline engine and the memory store. It is passed to
//! handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use querymind_pipeline::Engine;
use querymind_services::MemoryStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// The question-answering engine.
    pub engine: Arc<Engine>,
    /// Conversation memory, loaded before a run and written after it.
    pub memory: Arc<dyn MemoryStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Engine, memory: Arc<dyn MemoryStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            memory,
            start_time: Instant::now(),
        }
    }
}
