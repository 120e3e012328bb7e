//! Semantic strategy: vector product search hydrated through SQL.
//!
//! The searcher returns product ids ranked by similarity; a single
//! aggregation query then attaches sales and review data to those ids. An
//! empty hit list is a legitimate answer, not an error, and skips the
//! database entirely.

use tracing::{info, warn};

use querymind_services::{RelationalStore, RetrievalError, TextGenerator, VectorSearcher};

use crate::enhancer::ContextEnhancer;
use crate::state::QueryState;

pub struct SemanticNode;

impl SemanticNode {
    pub async fn run(
        state: &mut QueryState,
        gateway: &dyn TextGenerator,
        searcher: &dyn VectorSearcher,
        store: &dyn RelationalStore,
        top_k: usize,
    ) {
        let question =
            ContextEnhancer::enhance(&state.query, &state.memory_context, gateway).await;

        let ids = match searcher.search(&question, top_k).await {
            Ok(ids) => ids,
            Err(err) => {
                state.error = Some(describe_retrieval_error(&err));
                state.results = Vec::new();
                return;
            }
        };

        if ids.is_empty() {
            info!("vector search returned no hits");
            state.results = Vec::new();
            return;
        }

        let sql = hydration_sql(&ids);
        match store.execute(&sql).await {
            Ok(rows) => {
                info!(hits = ids.len(), rows = rows.len(), "semantic results hydrated");
                state.results = rows;
            }
            Err(err) => {
                warn!(error = %err.message(), "semantic hydration query failed");
                state.error =
                    Some("could not load details for the matching products".to_string());
                state.results = Vec::new();
            }
        }
    }
}

fn describe_retrieval_error(err: &RetrievalError) -> String {
    warn!(error = %err, "vector search failed");
    match err {
        RetrievalError::Auth(_) => {
            "product search is not available right now (authorization failed)".to_string()
        }
        RetrievalError::Quota => {
            "product search is temporarily rate limited, please try again shortly".to_string()
        }
        RetrievalError::EmptyIndex => {
            "the product search index is empty, so no products could be matched".to_string()
        }
        RetrievalError::Transport(_) => {
            "product search is not reachable right now".to_string()
        }
    }
}

/// One aggregation over the matched ids: English category names, order and
/// review rollups, and a sample of review text per product.
fn hydration_sql(ids: &[String]) -> String {
    let id_list = ids
        .iter()
        .map(|id| format!("'{}'", id.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT p.product_id, \
         t.product_category_name_english AS category, \
         COUNT(DISTINCT oi.order_id) AS times_ordered, \
         ROUND(AVG(r.review_score)::numeric, 2) AS avg_score, \
         STRING_AGG(DISTINCT LEFT(r.review_comment_message, 120), ' | ') AS review_sample \
         FROM products p \
         JOIN product_category_translation t \
           ON t.product_category_name = p.product_category_name \
         LEFT JOIN order_items oi ON oi.product_id = p.product_id \
         LEFT JOIN order_reviews r ON r.order_id = oi.order_id \
         WHERE p.product_id IN ({id_list}) \
         GROUP BY p.product_id, t.product_category_name_english \
         ORDER BY times_ordered DESC"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use querymind_core::{MemoryContext, Row};
    use querymind_services::{MockGateway, MockSearcher, MockStore};

    fn state_for(query: &str) -> QueryState {
        QueryState::new(query, MemoryContext::new())
    }

    // ---- hit path ----

    #[tokio::test]
    async fn hits_are_hydrated_with_one_query() {
        let gateway = MockGateway::new();
        let searcher = MockSearcher::new();
        searcher.push_ids(vec!["p1", "p2"]);
        let store = MockStore::default();
        let mut row = Row::new();
        row.insert("product_id".into(), serde_json::json!("p1"));
        store.push_rows(vec![row]);

        let mut state = state_for("comfortable office chair");
        SemanticNode::run(&mut state, &gateway, &searcher, &store, 5).await;

        assert_eq!(state.results.len(), 1);
        assert!(state.error.is_none());
        // semantic never exposes generated SQL
        assert!(state.sql_query.is_none());
        let sql = &store.executed_sql()[0];
        assert!(sql.contains("IN ('p1', 'p2')"));
        assert!(sql.contains("product_category_translation"));
    }

    #[tokio::test]
    async fn ids_are_quoted_and_escaped() {
        let sql = hydration_sql(&["it's".to_string()]);
        assert!(sql.contains("IN ('it''s')"));
    }

    // ---- empty and failure paths ----

    #[tokio::test]
    async fn zero_hits_skip_the_database() {
        let gateway = MockGateway::new();
        let searcher = MockSearcher::new();
        searcher.push_ids(vec![]);
        let store = MockStore::default();

        let mut state = state_for("a product nobody sells");
        SemanticNode::run(&mut state, &gateway, &searcher, &store, 5).await;

        assert!(state.results.is_empty());
        assert!(state.error.is_none());
        assert_eq!(store.execute_count(), 0);
    }

    #[tokio::test]
    async fn retrieval_failures_are_described_per_variant() {
        let gateway = MockGateway::new();
        let searcher = MockSearcher::new();
        searcher.push_error(RetrievalError::Quota);
        let store = MockStore::default();

        let mut state = state_for("office chair");
        SemanticNode::run(&mut state, &gateway, &searcher, &store, 5).await;

        assert!(state.error.unwrap().contains("rate limited"));
        assert_eq!(store.execute_count(), 0);
    }

    #[tokio::test]
    async fn hydration_failure_is_sanitized() {
        let gateway = MockGateway::new();
        let searcher = MockSearcher::new();
        searcher.push_ids(vec!["p1"]);
        let store = MockStore::default();
        store.push_error(querymind_services::QueryError::Connection("pg down".into()));

        let mut state = state_for("office chair");
        SemanticNode::run(&mut state, &gateway, &searcher, &store, 5).await;

        let error = state.error.unwrap();
        assert!(error.contains("could not load details"));
        assert!(!error.contains("pg down"));
    }
}
