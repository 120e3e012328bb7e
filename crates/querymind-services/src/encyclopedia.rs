//! Encyclopedia lookup service.
//!
//! One lookup is two requests against a Wikipedia-compatible API: a page
//! existence check (bounded by the page timeout) followed by a summary fetch
//! (bounded by the shorter summary timeout). The retry policy around
//! [`EncyclopediaClient::lookup`] belongs to the tool node, not this client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Errors from the encyclopedia lookup service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,
    #[error("no article found for topic")]
    NotFound,
    #[error("lookup transport failed: {0}")]
    Transport(String),
}

impl From<LookupError> for querymind_core::QuerymindError {
    fn from(err: LookupError) -> Self {
        querymind_core::QuerymindError::Lookup(err.to_string())
    }
}

/// A service that resolves a topic string to a summary.
#[async_trait]
pub trait EncyclopediaClient: Send + Sync {
    async fn lookup(&self, topic: &str) -> Result<String, LookupError>;
}

// =============================================================================
// Wikipedia adapter
// =============================================================================

/// Client for the Wikipedia action + REST APIs.
pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
    page_timeout: Duration,
    summary_timeout: Duration,
}

impl WikipediaClient {
    pub fn new(
        base_url: impl Into<String>,
        page_timeout: Duration,
        summary_timeout: Duration,
    ) -> Result<Self, LookupError> {
        // Wikipedia requires a descriptive user agent.
        let http = reqwest::Client::builder()
            .user_agent("QueryMind/0.1 (e-commerce assistant)")
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            page_timeout,
            summary_timeout,
        })
    }

    /// Resolve the topic to a canonical page title, or `NotFound`.
    async fn resolve_title(&self, topic: &str) -> Result<String, LookupError> {
        let url = format!("{}/w/api.php", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.page_timeout)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("redirects", "1"),
                ("titles", topic),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(LookupError::Transport(format!(
                "status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await.map_err(map_reqwest_error)?;
        let pages = body
            .pointer("/query/pages")
            .and_then(Value::as_object)
            .ok_or(LookupError::NotFound)?;

        for (_, page) in pages {
            if page.get("missing").is_some() {
                return Err(LookupError::NotFound);
            }
            if let Some(title) = page.get("title").and_then(Value::as_str) {
                return Ok(title.to_string());
            }
        }
        Err(LookupError::NotFound)
    }

    /// Fetch the summary extract for a resolved title.
    async fn fetch_summary(&self, title: &str) -> Result<String, LookupError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::Transport("base URL cannot carry a path".into()))?
            .extend(["api", "rest_v1", "page", "summary", title]);

        let response = self
            .http
            .get(url)
            .timeout(self.summary_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }
        if !response.status().is_success() {
            return Err(LookupError::Transport(format!(
                "status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await.map_err(map_reqwest_error)?;
        let extract = body
            .get("extract")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if extract.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(extract.to_string())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(err.to_string())
    }
}

#[async_trait]
impl EncyclopediaClient for WikipediaClient {
    async fn lookup(&self, topic: &str) -> Result<String, LookupError> {
        let title = self.resolve_title(topic).await?;
        self.fetch_summary(&title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WikipediaClient {
        WikipediaClient::new(
            "https://en.wikipedia.org",
            Duration::from_secs(15),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_error_display() {
        assert_eq!(LookupError::Timeout.to_string(), "lookup timed out");
        assert_eq!(
            LookupError::NotFound.to_string(),
            "no article found for topic"
        );
        assert!(LookupError::Transport("dns failure".into())
            .to_string()
            .contains("dns failure"));
    }

    #[test]
    fn test_client_construction() {
        let c = client();
        assert_eq!(c.page_timeout, Duration::from_secs(15));
        assert_eq!(c.summary_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_summary_url_encodes_title() {
        let mut url = reqwest::Url::parse("https://en.wikipedia.org").unwrap();
        url.path_segments_mut()
            .unwrap()
            .extend(["api", "rest_v1", "page", "summary", "Boleto banc\u{00e1}rio"]);
        let s = url.as_str();
        assert!(s.contains("/api/rest_v1/page/summary/"));
        // Spaces and non-ASCII are percent-encoded by the URL builder.
        assert!(!s.contains(' '));
    }
}
