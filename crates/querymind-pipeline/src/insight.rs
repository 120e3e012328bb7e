//! Insight synthesis.
//!
//! Turns tabular results into three to five business-readable bullets. The
//! node is strictly best-effort: failed states, empty results, and tool
//! answers produce no insights, and a failed generation leaves the field
//! unset rather than erroring the whole pipeline.

use tracing::{debug, warn};

use querymind_services::TextGenerator;

use crate::prompts;
use crate::state::{Intent, QueryState};
use crate::text::{collapse_blank_lines, ensure_bullets, strip_emoji};

const SAMPLE_ROWS: usize = 20;

pub struct InsightNode;

impl InsightNode {
    pub async fn run(state: &mut QueryState, gateway: &dyn TextGenerator) {
        if state.error.is_some()
            || state.results.is_empty()
            || state.intent == Some(Intent::Tool)
        {
            state.insights = None;
            return;
        }

        let sample = &state.results[..state.results.len().min(SAMPLE_ROWS)];
        let sample_json = serde_json::to_string_pretty(sample).unwrap_or_default();

        match gateway.generate(&prompts::insights_prompt(&state.query, &sample_json)).await {
            Ok(reply) => {
                let cleaned = clean_insights(&reply);
                if cleaned.is_empty() {
                    state.insights = None;
                } else {
                    debug!(chars = cleaned.len(), "insights synthesized");
                    state.insights = Some(cleaned);
                }
            }
            Err(err) => {
                warn!(error = %err, "insight generation failed");
                state.insights = None;
            }
        }
    }
}

/// Emoji out, blank runs collapsed, every paragraph a bullet.
fn clean_insights(raw: &str) -> String {
    ensure_bullets(&collapse_blank_lines(&strip_emoji(raw)))
}
