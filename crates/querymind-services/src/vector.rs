//! Vector retrieval service.
//!
//! Given free text, returns an ordered list of entity identifiers by semantic
//! similarity. Embedding generation and index builds live in the retrieval
//! sidecar, not here.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Errors from the vector retrieval service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval authentication failed: {0}")]
    Auth(String),
    #[error("retrieval quota exceeded")]
    Quota,
    #[error("vector index is empty or not initialized")]
    EmptyIndex,
    #[error("retrieval transport failed: {0}")]
    Transport(String),
}

impl From<RetrievalError> for querymind_core::QuerymindError {
    fn from(err: RetrievalError) -> Self {
        querymind_core::QuerymindError::Retrieval(err.to_string())
    }
}

/// A service that resolves text to semantically similar entity identifiers.
#[async_trait]
pub trait VectorSearcher: Send + Sync {
    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<String>, RetrievalError>;
}

// =============================================================================
// HTTP sidecar adapter
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    ids: Vec<String>,
}

/// Client for the retrieval sidecar's JSON search endpoint.
pub struct HttpVectorSearcher {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl HttpVectorSearcher {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            collection: collection.into(),
        })
    }
}

#[async_trait]
impl VectorSearcher for HttpVectorSearcher {
    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<String>, RetrievalError> {
        let url = format!(
            "{}/collections/{}/search",
            self.base_url, self.collection
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({ "text": text, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RetrievalError::Auth(format!("status {}", status)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RetrievalError::Quota);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains("empty")
                || body.to_lowercase().contains("not found")
            {
                return Err(RetrievalError::EmptyIndex);
            }
            return Err(RetrievalError::Transport(format!("status {}", status)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;
        Ok(parsed.ids)
    }
}
