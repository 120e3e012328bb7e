//! Conversational memory store.
//!
//! The pipeline loads context once at request start and reads it only; the
//! exchange write-back after a response is fire-and-forget on the caller side.

use async_trait::async_trait;
use serde_json::{json, Value};

use querymind_core::MemoryContext;

/// Errors from the memory backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("memory backend error: {0}")]
pub struct MemoryError(pub String);

impl From<MemoryError> for querymind_core::QuerymindError {
    fn from(err: MemoryError) -> Self {
        querymind_core::QuerymindError::Memory(err.to_string())
    }
}

/// A store for prior conversation context.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Load prior context for a user/conversation pair.
    async fn get_context(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<MemoryContext, MemoryError>;

    /// Record one query/response exchange.
    async fn store_exchange(
        &self,
        user_id: &str,
        conversation_id: &str,
        query: &str,
        response: &str,
    ) -> Result<(), MemoryError>;
}

// =============================================================================
// HTTP adapter
// =============================================================================

/// Client for a REST memory backend.
pub struct HttpMemoryStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpMemoryStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, MemoryError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| MemoryError(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn get_context(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<MemoryContext, MemoryError> {
        let url = format!("{}/context", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("user_id", user_id), ("conversation_id", conversation_id)])
            .send()
            .await
            .map_err(|e| MemoryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError(format!("status {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MemoryError(e.to_string()))?;

        // Backends differ on the envelope; probe the common shapes.
        let context = body
            .get("context")
            .or_else(|| body.get("data"))
            .unwrap_or(&body);
        Ok(context.as_object().cloned().unwrap_or_default())
    }

    async fn store_exchange(
        &self,
        user_id: &str,
        conversation_id: &str,
        query: &str,
        response: &str,
    ) -> Result<(), MemoryError> {
        let url = format!("{}/exchange", self.base_url);
        let result = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "user_id": user_id,
                "conversation_id": conversation_id,
                "message": query,
                "response": response,
            }))
            .send()
            .await
            .map_err(|e| MemoryError(e.to_string()))?;

        if !result.status().is_success() {
            return Err(MemoryError(format!("status {}", result.status())));
        }
        Ok(())
    }
}

// =============================================================================
// Null adapter
// =============================================================================

/// Memory store used when no backend is configured: empty context, writes
/// are accepted and dropped.
pub struct NullMemory;

#[async_trait]
impl MemoryStore for NullMemory {
    async fn get_context(
        &self,
        _user_id: &str,
        _conversation_id: &str,
    ) -> Result<MemoryContext, MemoryError> {
        Ok(MemoryContext::new())
    }

    async fn store_exchange(
        &self,
        _user_id: &str,
        _conversation_id: &str,
        _query: &str,
        _response: &str,
    ) -> Result<(), MemoryError> {
        Ok(())
    }
}
