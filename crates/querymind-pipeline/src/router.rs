//! Intent classification.
//!
//! Two tiers: an ordered keyword pass that resolves the common analytical
//! questions without a model call, then a generative classification for
//! everything the keywords cannot settle. A question that looks analytical
//! but also carries definition vocabulary ("what does delivered mean?") is
//! deliberately kicked to the generative tier.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use querymind_core::{serialize_context, MemoryContext};
use querymind_services::TextGenerator;

use crate::prompts;
use crate::state::Intent;
use crate::text::strip_code_fences;

// ============================================================================
// Keyword tables
// ============================================================================

// Word boundaries matter: "laptop" must not match "top".
static ANALYTICAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\btop\b",
        r"\bbest\b",
        r"\bmost\b",
        r"\bhighest\b",
        r"\blowest\b",
        r"\btotal\b",
        r"\bcount\b",
        r"\baverage\b",
        r"\bavg\b",
        r"\brevenue\b",
        r"\bsales\b",
        r"\bhow\s+many\b",
        r"\bsum\b",
        r"\btrend\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("analytical pattern"))
    .collect()
});

static DEFINITION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bwhat\s+is\b",
        r"\bwhat\s+does\b",
        r"\bmean(s|ing)?\b",
        r"\btranslate\b",
        r"\bdefine\b",
        r"\bdefinition\b",
        r"\bexplain\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("definition pattern"))
    .collect()
});

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// The analytical keyword test alone, without the definition exclusion.
/// Used both by the fast path and as the fallback when the generative tier
/// produces nothing usable.
fn looks_analytical(lowered: &str) -> bool {
    matches_any(&ANALYTICAL_PATTERNS, lowered)
}

// ============================================================================
// Router
// ============================================================================

pub struct IntentRouter;

impl IntentRouter {
    /// Classifies a question. Never fails: the worst case is the
    /// conversational bucket.
    pub async fn classify(
        query: &str,
        context: &MemoryContext,
        gateway: &dyn TextGenerator,
    ) -> Intent {
        let lowered = query.to_lowercase();

        // Fast path: clearly analytical, no definition vocabulary in sight.
        if looks_analytical(&lowered) && !matches_any(&DEFINITION_PATTERNS, &lowered) {
            debug!(intent = "analytical", "classified by keyword rules");
            return Intent::Analytical;
        }

        let serialized = serialize_context(context);
        let prompt = prompts::classification_prompt(query, serialized.as_deref());
        match gateway.generate(&prompt).await {
            Ok(reply) => {
                if let Some(intent) = parse_intent_reply(&reply) {
                    debug!(intent = %intent, "classified by model");
                    return intent;
                }
                warn!(reply = %reply, "unparseable classification reply");
            }
            Err(err) => {
                warn!(error = %err, "classification call failed");
            }
        }

        // Degraded path: the keyword test again, this time without the
        // definition exclusion, then the conversational floor.
        if looks_analytical(&lowered) {
            Intent::Analytical
        } else {
            Intent::Conversational
        }
    }
}

/// Pulls an intent out of a model reply: fenced or bare JSON first, then a
/// plain-label scan of the whole reply.
fn parse_intent_reply(reply: &str) -> Option<Intent> {
    let cleaned = strip_code_fences(reply);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        if let Some(label) = value.get("intent").and_then(Value::as_str) {
            if let Some(intent) = Intent::from_label(label) {
                return Some(intent);
            }
        }
    }
    let lowered = cleaned.to_lowercase();
    ["analytical", "semantic", "tool", "conversational"]
        .iter()
        .find(|label| lowered.contains(*label))
        .and_then(|label| Intent::from_label(label))
}

// ============================================================================
// Tests
// ============================================================================
