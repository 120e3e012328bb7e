//! Context-aware query rewriting.
//!
//! Follow-up questions ("and for last month?") only make sense against prior
//! conversation context. When context exists, the enhancer asks the model
//! for a standalone rewrite; on any failure the original question is used
//! unchanged, so enhancement can never break a query that was fine already.

use tracing::{debug, warn};

use querymind_core::{serialize_context, MemoryContext};
use querymind_services::TextGenerator;

use crate::prompts;
use crate::text::strip_code_fences;

pub struct ContextEnhancer;

impl ContextEnhancer {
    /// Returns the question the strategy should actually run. With no usable
    /// context the input is returned as-is and the gateway is never called.
    pub async fn enhance(
        query: &str,
        context: &MemoryContext,
        gateway: &dyn TextGenerator,
    ) -> String {
        let Some(serialized) = serialize_context(context) else {
            return query.to_string();
        };

        match gateway.generate(&prompts::rewrite_prompt(query, &serialized)).await {
            Ok(reply) => {
                let rewritten = strip_code_fences(&reply);
                if rewritten.is_empty() {
                    warn!("empty rewrite reply, keeping original query");
                    query.to_string()
                } else {
                    debug!(original = %query, rewritten = %rewritten, "query rewritten");
                    rewritten
                }
            }
            Err(err) => {
                warn!(error = %err, "rewrite call failed, keeping original query");
                query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querymind_services::{GenerationError, MockGateway};

    fn context_with(key: &str, value: &str) -> MemoryContext {
        let mut ctx = MemoryContext::new();
        ctx.insert(key.into(), serde_json::json!(value));
        ctx
    }

    #[tokio::test]
    async fn empty_context_skips_the_gateway() {
        let gateway = MockGateway::new();
        let out = ContextEnhancer::enhance("top products", &MemoryContext::new(), &gateway).await;
        assert_eq!(out, "top products");
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn context_triggers_a_rewrite() {
        let gateway = MockGateway::new();
        gateway.push_reply("top selling products in the electronics category");
        let ctx = context_with("last_topic", "electronics category");
        let out = ContextEnhancer::enhance("and the top products?", &ctx, &gateway).await;
        assert_eq!(out, "top selling products in the electronics category");
        assert!(gateway.prompts()[0].contains("electronics category"));
    }

    #[tokio::test]
    async fn rewrite_failure_keeps_the_original() {
        let gateway = MockGateway::new();
        gateway.push_error(GenerationError::Transport("down".into()));
        let ctx = context_with("last_topic", "chairs");
        let out = ContextEnhancer::enhance("and the cheapest?", &ctx, &gateway).await;
        assert_eq!(out, "and the cheapest?");
    }

    #[tokio::test]
    async fn empty_rewrite_keeps_the_original() {
        let gateway = MockGateway::new();
        gateway.push_reply("   ");
        let ctx = context_with("last_topic", "chairs");
        let out = ContextEnhancer::enhance("and the cheapest?", &ctx, &gateway).await;
        assert_eq!(out, "and the cheapest?");
    }
}
