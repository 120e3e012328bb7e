//! Route handler functions for all API endpoints.
//!
//! The chat handler runs one question through the engine. Memory is read
//! before the run and written after it on a detached task, so a slow or
//! failing memory backend never delays the response.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use querymind_core::{MemoryContext, Row};
use querymind_pipeline::{Intent, VisualizationConfig};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub intent: Option<Intent>,
    pub sql_query: Option<String>,
    pub results: Vec<Row>,
    pub visualization_config: Option<VisualizationConfig>,
    pub insights: Option<String>,
    pub error: Option<String>,
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /api/chat/query
///
/// Runs a question through the pipeline. Always 200 for well-formed
/// requests; strategy failures are carried inside the body.
pub async fn chat_query(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    let conversation_id = request
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let user_id = request
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string());

    let context = match state.memory.get_context(&user_id, &conversation_id).await {
        Ok(context) => context,
        Err(err) => {
            warn!(error = %err, "memory context load failed, continuing without");
            MemoryContext::new()
        }
    };

    let result = state.engine.run(&message, context).await;
    let summary = result.summary_message();

    // fire and forget: the response does not wait on the memory write
    {
        let memory = state.memory.clone();
        let query = message.clone();
        let response = summary.clone();
        let user = user_id.clone();
        let conversation = conversation_id.clone();
        tokio::spawn(async move {
            if let Err(err) =
                memory.store_exchange(&user, &conversation, &query, &response).await
            {
                warn!(error = %err, "memory exchange write failed");
            }
        });
    }

    Ok(Json(ChatResponse {
        message: summary,
        intent: result.intent,
        sql_query: result.sql_query,
        results: result.results,
        visualization_config: result.visualization_config,
        insights: result.insights,
        error: result.error,
        conversation_id,
    }))
}
