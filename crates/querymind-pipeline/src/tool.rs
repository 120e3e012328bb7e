//! Tool strategy: encyclopedia lookups with a glossary fallback.
//!
//! The model picks either a Wikipedia lookup or a direct definition. Lookup
//! failures other than "no such article" are retried with doubling backoff;
//! when the retries run out (or the article simply does not exist) the topic
//! is handed to the glossary path instead, so the user still gets an answer.

use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use querymind_services::{EncyclopediaClient, LookupError, TextGenerator};

use crate::prompts;
use crate::state::{QueryState, VisualizationConfig};
use crate::text::{strip_code_fences, truncate_chars};

pub struct ToolNode;

/// Retry knobs for the encyclopedia path.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff: Duration::from_secs(2) }
    }
}

enum ToolChoice {
    Lookup(String),
    Definition(String),
}

impl ToolNode {
    pub async fn run(
        state: &mut QueryState,
        gateway: &dyn TextGenerator,
        encyclopedia: &dyn EncyclopediaClient,
        policy: RetryPolicy,
        summary_max_chars: usize,
    ) {
        let choice = Self::choose_tool(&state.query, gateway).await;

        let text = match choice {
            ToolChoice::Lookup(topic) => {
                match Self::lookup_with_retry(encyclopedia, &topic, policy).await {
                    Some(summary) => truncate_chars(&summary, summary_max_chars),
                    // glossary fallback keeps the topic as the term
                    None => Self::define(gateway, &topic).await,
                }
            }
            ToolChoice::Definition(term) => Self::define(gateway, &term).await,
        };

        let mut row = querymind_core::Row::new();
        row.insert("response".to_string(), Value::String(text));
        state.results = vec![row];
        state.visualization_config = Some(VisualizationConfig::text());
    }

    /// Parses the model's tool choice; anything unparseable degrades to a
    /// definition of the whole question.
    async fn choose_tool(query: &str, gateway: &dyn TextGenerator) -> ToolChoice {
        match gateway.generate(&prompts::tool_choice_prompt(query)).await {
            Ok(reply) => {
                let cleaned = strip_code_fences(&reply);
                if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
                    let parameter = value
                        .get("parameter")
                        .and_then(Value::as_str)
                        .unwrap_or(query)
                        .to_string();
                    match value.get("tool").and_then(Value::as_str) {
                        Some("wikipedia_lookup") => return ToolChoice::Lookup(parameter),
                        Some("get_definition") => return ToolChoice::Definition(parameter),
                        other => {
                            warn!(tool = ?other, "unknown tool choice, defaulting to definition")
                        }
                    }
                } else {
                    warn!(reply = %reply, "unparseable tool choice reply");
                }
            }
            Err(err) => warn!(error = %err, "tool choice call failed"),
        }
        ToolChoice::Definition(query.to_string())
    }

    /// Up to `max_attempts` lookups, sleeping only between attempts. A
    /// missing article is final and is not retried.
    async fn lookup_with_retry(
        encyclopedia: &dyn EncyclopediaClient,
        topic: &str,
        policy: RetryPolicy,
    ) -> Option<String> {
        let mut delay = policy.initial_backoff;
        for attempt in 1..=policy.max_attempts {
            match encyclopedia.lookup(topic).await {
                Ok(summary) => {
                    info!(topic, attempt, "encyclopedia lookup succeeded");
                    return Some(summary);
                }
                Err(LookupError::NotFound) => {
                    debug!(topic, "no encyclopedia article, using glossary fallback");
                    return None;
                }
                Err(err) => {
                    warn!(topic, attempt, error = %err, "encyclopedia lookup failed");
                    if attempt < policy.max_attempts {
                        sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        None
    }

    async fn define(gateway: &dyn TextGenerator, term: &str) -> String {
        match gateway.generate(&prompts::definition_prompt(term)).await {
            Ok(reply) => {
                let cleaned = strip_code_fences(&reply);
                if cleaned.is_empty() {
                    format!("I could not find a definition for \"{term}\".")
                } else {
                    cleaned
                }
            }
            Err(err) => {
                warn!(error = %err, "definition call failed");
                format!("I could not look up \"{term}\" right now, please try again later.")
            }
        }
    }
}
