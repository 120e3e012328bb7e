//! Analytical strategy: schema-grounded SQL generation and execution.
//!
//! The only node that sets `sql_query`, and it does so before execution so
//! the generated statement survives into the final state even when the
//! database rejects it.

use tracing::{info, warn};

use querymind_services::{QueryError, RelationalStore, TextGenerator};

use crate::enhancer::ContextEnhancer;
use crate::prompts;
use crate::state::QueryState;
use crate::text::{strip_code_fences, strip_trailing_terminator};

pub struct AnalyticalNode;

impl AnalyticalNode {
    pub async fn run(
        state: &mut QueryState,
        gateway: &dyn TextGenerator,
        store: &dyn RelationalStore,
    ) {
        let schema = match store.fetch_schema().await {
            Ok(schema) => schema,
            Err(err) => {
                warn!(error = %err.message(), "schema fetch failed");
                state.error = Some("could not read the database schema".to_string());
                state.results = Vec::new();
                return;
            }
        };
        state.db_schema = schema;

        let question =
            ContextEnhancer::enhance(&state.query, &state.memory_context, gateway).await;

        let prompt = prompts::sql_prompt(&state.db_schema, &question);
        let sql = match gateway.generate(&prompt).await {
            Ok(reply) => strip_trailing_terminator(&strip_code_fences(&reply)),
            Err(err) => {
                warn!(error = %err, "sql generation failed");
                state.error = Some("could not generate a query for your question".to_string());
                state.results = Vec::new();
                return;
            }
        };
        if sql.is_empty() {
            state.error = Some("could not generate a query for your question".to_string());
            state.results = Vec::new();
            return;
        }
        state.sql_query = Some(sql.clone());

        match store.execute(&sql).await {
            Ok(rows) => {
                info!(rows = rows.len(), "analytical query executed");
                state.results = rows;
            }
            Err(err) => {
                state.error = Some(classify_query_error(&err));
                state.results = Vec::new();
            }
        }
    }
}

/// Maps a driver failure to a stable human-readable description. Ordered:
/// syntax problems first, missing relations second, everything else last.
/// Raw driver text is logged but never stored in the state.
fn classify_query_error(err: &QueryError) -> String {
    let message = err.message().to_lowercase();
    warn!(error = %err.message(), "analytical query failed");
    if message.contains("syntax error") {
        "SQL syntax error: the generated query was not valid".to_string()
    } else if message.contains("does not exist") || message.contains("missing") {
        "table or column not found: the query referenced something not in the schema"
            .to_string()
    } else {
        "query execution failed, please try rephrasing your question".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querymind_core::MemoryContext;
    use querymind_services::{MockGateway, MockStore};

    fn state_for(query: &str) -> QueryState {
        QueryState::new(query, MemoryContext::new())
    }

    fn row(key: &str, value: i64) -> querymind_core::Row {
        let mut row = querymind_core::Row::new();
        row.insert(key.into(), serde_json::json!(value));
        row
    }

    // ---- happy path ----

    #[tokio::test]
    async fn generates_cleans_and_executes_sql() {
        let gateway = MockGateway::new();
        gateway.push_reply("```sql\nSELECT COUNT(*) AS n FROM order_items;\n```");
        let store = MockStore::new("Table: order_items");
        store.push_rows(vec![row("n", 42)]);

        let mut state = state_for("how many items were sold?");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        assert_eq!(state.sql_query.as_deref(), Some("SELECT COUNT(*) AS n FROM order_items"));
        assert_eq!(state.results.len(), 1);
        assert!(state.error.is_none());
        assert_eq!(store.executed_sql(), vec!["SELECT COUNT(*) AS n FROM order_items"]);
    }

    // ---- failure classification ----

    #[tokio::test]
    async fn syntax_errors_get_the_syntax_message() {
        let gateway = MockGateway::new();
        gateway.push_reply("SELEC broken");
        let store = MockStore::new("Table: order_items");
        store.push_error(QueryError::Execution("syntax error at or near \"SELEC\"".into()));

        let mut state = state_for("count everything");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        assert_eq!(
            state.error.as_deref(),
            Some("SQL syntax error: the generated query was not valid")
        );
        assert!(state.results.is_empty());
        // the failed statement is still inspectable
        assert_eq!(state.sql_query.as_deref(), Some("SELEC broken"));
    }

    #[tokio::test]
    async fn missing_relations_get_the_not_found_message() {
        let gateway = MockGateway::new();
        gateway.push_reply("SELECT * FROM ghosts");
        let store = MockStore::new("Table: order_items");
        store.push_error(QueryError::Execution("relation \"ghosts\" does not exist".into()));

        let mut state = state_for("list the ghosts");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        let error = state.error.expect("error set");
        assert!(error.contains("table or column not found"));
        // raw driver text never leaks
        assert!(!error.contains("ghosts"));
    }

    #[tokio::test]
    async fn other_failures_get_the_generic_message() {
        let gateway = MockGateway::new();
        gateway.push_reply("SELECT 1");
        let store = MockStore::new("Table: order_items");
        store.push_error(QueryError::Connection("pool timed out".into()));

        let mut state = state_for("anything");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        assert!(state.error.unwrap().contains("query execution failed"));
    }

    // ---- upstream failures ----

    #[tokio::test]
    async fn schema_failure_stops_before_generation() {
        let gateway = MockGateway::new();
        let store = MockStore::default();
        store.push_schema_error(QueryError::Connection("unreachable".into()));

        let mut state = state_for("top products");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        assert_eq!(state.error.as_deref(), Some("could not read the database schema"));
        assert_eq!(gateway.call_count(), 0);
        assert!(state.sql_query.is_none());
    }

    #[tokio::test]
    async fn generation_failure_sets_a_stable_message() {
        let gateway = MockGateway::new();
        gateway.push_error(querymind_services::GenerationError::Quota);
        let store = MockStore::new("Table: order_items");

        let mut state = state_for("top products");
        AnalyticalNode::run(&mut state, &gateway, &store).await;

        assert_eq!(
            state.error.as_deref(),
            Some("could not generate a query for your question")
        );
        assert_eq!(store.execute_count(), 0);
    }
}
