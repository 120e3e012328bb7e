//! End-to-end pipeline walks with scripted services.

use std::sync::Arc;
use std::time::Duration;

use querymind_core::{MemoryContext, Row};
use querymind_pipeline::{ChartType, Engine, Intent, PipelineOptions, PipelineServices};
use querymind_services::{
    GenerationError, LookupError, MockEncyclopedia, MockGateway, MockSearcher, MockStore,
    QueryError,
};

struct Harness {
    gateway: Arc<MockGateway>,
    store: Arc<MockStore>,
    searcher: Arc<MockSearcher>,
    encyclopedia: Arc<MockEncyclopedia>,
    engine: Engine,
}

fn harness() -> Harness {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MockStore::new(
        "Database Schema:\n\nTable: products\n  - product_id: text NOT NULL\n\n\
         Table: order_items\n  - price: numeric NULL\n",
    ));
    let searcher = Arc::new(MockSearcher::new());
    let encyclopedia = Arc::new(MockEncyclopedia::new());
    let services = PipelineServices {
        gateway: gateway.clone(),
        store: store.clone(),
        searcher: searcher.clone(),
        encyclopedia: encyclopedia.clone(),
    };
    let engine = Engine::new(services, PipelineOptions::default());
    Harness { gateway, store, searcher, encyclopedia, engine }
}

fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    let mut row = Row::new();
    for (key, value) in pairs {
        row.insert(key.to_string(), value.clone());
    }
    row
}

// ---- analytical ----

#[tokio::test]
async fn analytical_question_runs_sql_without_a_classification_call() {
    let h = harness();
    // fast-path classification: only sql generation and downstream calls hit
    // the gateway, so the first prompt must be the SQL prompt
    h.gateway.push_reply("SELECT category, total_sold FROM sales ORDER BY total_sold DESC");
    h.gateway.push_reply(r#"{"type": "bar", "xAxis": "category", "yAxis": "total_sold"}"#);
    h.gateway.push_reply("\u{2022} **Leader:** one category dominates");
    h.store.push_rows(vec![row(&[
        ("category", serde_json::json!("toys")),
        ("total_sold", serde_json::json!(120)),
    ])]);

    let state = h.engine.run("Top 5 best selling products", MemoryContext::new()).await;

    assert_eq!(state.intent, Some(Intent::Analytical));
    assert!(h.gateway.prompts()[0].contains("PostgreSQL"));
    assert!(state.sql_query.is_some());
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.visualization_config.unwrap().chart_type, ChartType::Bar);
    assert!(state.insights.unwrap().contains("Leader"));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn failed_sql_keeps_the_statement_and_reports_cleanly() {
    let h = harness();
    h.gateway.push_reply("SELECT * FROM ghosts");
    h.store.push_error(QueryError::Execution("relation \"ghosts\" does not exist".into()));

    let state = h.engine.run("how many ghosts are there?", MemoryContext::new()).await;

    assert_eq!(state.sql_query.as_deref(), Some("SELECT * FROM ghosts"));
    assert!(state.results.is_empty());
    let error = state.error.as_ref().expect("error set");
    assert!(error.contains("table or column not found"));
    assert!(!error.contains("ghosts"));
    // failed branches get no chart and no insights
    assert!(state.visualization_config.is_none());
    assert!(state.insights.is_none());
    assert!(state.summary_message().contains("Sorry"));
}

#[tokio::test]
async fn memory_context_rewrites_the_question_before_sql() {
    let h = harness();
    h.gateway.push_reply("total revenue for the electronics category");
    h.gateway.push_reply("SELECT SUM(price) AS total_revenue FROM order_items");
    h.gateway.push_reply(r#"{"type": "table", "xAxis": null, "yAxis": null}"#);
    h.gateway.push_reply("\u{2022} **Revenue:** a concrete number");
    h.store.push_rows(vec![row(&[("total_revenue", serde_json::json!(1234.5))])]);

    let mut context = MemoryContext::new();
    context.insert("last_topic".into(), serde_json::json!("electronics category"));
    let state = h.engine.run("and the total revenue?", context).await;

    assert!(h.gateway.prompts()[0].contains("Rewrite"));
    assert!(h.gateway.prompts()[1].contains("electronics category"));
    assert!(state.error.is_none());
}

// ---- semantic ----

#[tokio::test]
async fn semantic_question_hydrates_vector_hits() {
    let h = harness();
    h.gateway.push_reply(r#"{"intent": "semantic"}"#);
    h.gateway.push_reply(r#"{"type": "table", "xAxis": null, "yAxis": null}"#);
    h.gateway.push_reply("\u{2022} **Match:** one strong candidate");
    h.searcher.push_ids(vec!["p1"]);
    h.store.push_rows(vec![row(&[
        ("product_id", serde_json::json!("p1")),
        ("times_ordered", serde_json::json!(7)),
    ])]);

    let state = h.engine.run("a comfortable office chair", MemoryContext::new()).await;

    assert_eq!(state.intent, Some(Intent::Semantic));
    assert_eq!(state.results.len(), 1);
    // semantic exposes no generated SQL even though it ran a query
    assert!(state.sql_query.is_none());
    assert_eq!(h.searcher.call_count(), 1);
}

#[tokio::test]
async fn zero_vector_hits_skip_the_database_entirely() {
    let h = harness();
    h.gateway.push_reply(r#"{"intent": "semantic"}"#);
    h.searcher.push_ids(vec![]);

    let state = h.engine.run("a product nobody sells", MemoryContext::new()).await;

    assert!(state.results.is_empty());
    assert!(state.error.is_none());
    assert_eq!(h.store.execute_count(), 0);
    assert_eq!(state.visualization_config.as_ref().unwrap().chart_type, ChartType::Table);
    assert!(state.insights.is_none());
    assert!(state.summary_message().contains("No matching data"));
}

// ---- tool ----

#[tokio::test(start_paused = true)]
async fn lookup_retries_three_times_with_backoff_then_falls_back() {
    let h = harness();
    h.gateway.push_reply(r#"{"intent": "tool"}"#);
    h.gateway.push_reply(r#"{"tool": "wikipedia_lookup", "parameter": "Boleto"}"#);
    h.gateway.push_reply("Boleto: a Brazilian cash payment slip.");
    h.encyclopedia.push_error(LookupError::Timeout);
    h.encyclopedia.push_error(LookupError::Timeout);
    h.encyclopedia.push_error(LookupError::Timeout);

    let started = tokio::time::Instant::now();
    let state = h.engine.run("what is boleto?", MemoryContext::new()).await;
    let elapsed = started.elapsed();

    assert_eq!(h.encyclopedia.call_count(), 3);
    // sleeps happen only between attempts: 2s then 4s, nothing after the last
    assert!(elapsed >= Duration::from_secs(6), "slept {elapsed:?}");
    assert!(elapsed < Duration::from_secs(7), "slept {elapsed:?}");
    assert_eq!(state.results.len(), 1);
    assert!(state.results[0]["response"].as_str().unwrap().contains("payment slip"));
    assert_eq!(state.visualization_config.unwrap().chart_type, ChartType::Text);
    assert!(state.insights.is_none());
}

#[tokio::test]
async fn successful_lookup_is_truncated_to_the_configured_length() {
    let h = harness();
    h.gateway.push_reply(r#"{"intent": "tool"}"#);
    h.gateway.push_reply(r#"{"tool": "wikipedia_lookup", "parameter": "Boleto"}"#);
    h.encyclopedia.push_summary("b".repeat(800));

    let state = h.engine.run("what is a boleto?", MemoryContext::new()).await;

    let text = state.results[0]["response"].as_str().unwrap();
    assert_eq!(text.chars().count(), 503);
    assert!(text.ends_with("..."));
}

// ---- conversational ----

#[tokio::test]
async fn greetings_short_circuit_every_service() {
    let h = harness();
    h.gateway.push_reply(r#"{"intent": "conversational"}"#);

    let state = h.engine.run("Hello!", MemoryContext::new()).await;

    assert_eq!(state.intent, Some(Intent::Conversational));
    assert!(state.results.is_empty());
    assert!(state.sql_query.is_none());
    assert!(state.visualization_config.is_none());
    assert!(state.error.is_none());
    assert_eq!(h.store.execute_count(), 0);
    assert_eq!(h.store.schema_call_count(), 0);
    assert_eq!(h.searcher.call_count(), 0);
    assert_eq!(h.encyclopedia.call_count(), 0);
    assert!(state.summary_message().starts_with("Hello!"));
}

// ---- degraded classification ----

#[tokio::test]
async fn classification_outage_still_terminates_cleanly() {
    let h = harness();
    h.gateway.push_error(GenerationError::Transport("gateway down".into()));

    let state = h.engine.run("tell me something nice", MemoryContext::new()).await;

    assert_eq!(state.intent, Some(Intent::Conversational));
    assert!(state.results.is_empty());
    assert!(state.error.is_none());
}

// ---- rating override, end to end ----

#[tokio::test]
async fn rating_questions_never_end_as_a_bare_table() {
    let h = harness();
    h.gateway.push_reply("SELECT product_id, avg_score FROM scores ORDER BY avg_score");
    h.gateway.push_reply(r#"{"type": "table", "xAxis": null, "yAxis": null}"#);
    h.gateway.push_reply("\u{2022} **Low scores:** a few products drag the average");
    h.store.push_rows(vec![row(&[
        ("product_id", serde_json::json!("p9")),
        ("avg_score", serde_json::json!(1.4)),
    ])]);

    let state = h
        .engine
        .run("which products have the lowest review score?", MemoryContext::new())
        .await;

    let config = state.visualization_config.unwrap();
    assert_eq!(config.chart_type, ChartType::Bar);
    assert_eq!(config.x_axis.as_deref(), Some("product_id"));
    assert_eq!(config.y_axis.as_deref(), Some("avg_score"));
}

// ---- the non-throwing contract ----

#[tokio::test]
async fn results_are_always_an_array_in_the_serialized_state() {
    let h = harness();
    h.gateway.push_error(GenerationError::Quota);

    let state = h.engine.run("anything at all", MemoryContext::new()).await;
    let value = serde_json::to_value(&state).unwrap();

    assert!(value["results"].is_array());
    assert!(value.get("intent").is_some());
}
