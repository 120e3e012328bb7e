//! Text-generation gateway.
//!
//! Everything in the pipeline that needs classification, SQL synthesis, or
//! summarization goes through [`TextGenerator::generate`]. Callers are
//! responsible for stripping markdown code fences and parsing JSON where they
//! expect it; the gateway returns the model's free-form text unchanged.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Errors from the text-generation gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("generation transport failed: {0}")]
    Transport(String),
    #[error("generation quota exceeded")]
    Quota,
    #[error("generation returned no content")]
    Empty,
}

impl From<GenerationError> for querymind_core::QuerymindError {
    fn from(err: GenerationError) -> Self {
        querymind_core::QuerymindError::Generation(err.to_string())
    }
}

/// A service that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// =============================================================================
// Gemini REST adapter
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Gateway adapter for the Gemini `generateContent` REST endpoint.
pub struct GeminiGateway {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGateway {
    /// Create a new gateway client with a per-call timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGateway {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::Quota);
        }
        if !response.status().is_success() {
            return Err(GenerationError::Transport(format!(
                "gateway returned status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}
