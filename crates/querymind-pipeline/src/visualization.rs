//! Visualization selection.
//!
//! Classifies result columns, asks the model for a chart choice over a small
//! sample, and applies one domain override: questions about ratings with a
//! numeric score column present never end up as a bare table. Every failure
//! path lands on the table fallback.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use querymind_core::Row;
use querymind_services::TextGenerator;

use crate::prompts;
use crate::state::{ChartType, Intent, QueryState, VisualizationConfig};
use crate::text::strip_code_fences;

const SAMPLE_ROWS: usize = 5;
const LONG_TEXT_CHARS: usize = 80;

static RATING_VOCAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(rating|ratings|score|scores|review|reviews|stars?)\b")
        .expect("rating vocab pattern"));

static COMPARISON_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(top|best|worst|most|least|highest|lowest|compare[ds]?|versus|vs|rank(ed|ing)?|trend)\b")
        .expect("comparison vocab pattern")
});

// ============================================================================
// Column classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Identifier,
    LongText,
    Text,
}

fn classify_column(name: &str, rows: &[Row]) -> ColumnKind {
    if name == "id" || name.ends_with("_id") {
        return ColumnKind::Identifier;
    }
    let mut saw_number = false;
    for row in rows {
        match row.get(name) {
            Some(Value::Number(_)) => saw_number = true,
            Some(Value::String(s)) if s.chars().count() > LONG_TEXT_CHARS => {
                return ColumnKind::LongText;
            }
            Some(Value::String(_)) => return ColumnKind::Text,
            _ => {}
        }
    }
    if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

fn column_names(rows: &[Row]) -> Vec<String> {
    rows.first().map(|row| row.keys().cloned().collect()).unwrap_or_default()
}

// ============================================================================
// Node
// ============================================================================

pub struct VisualizationNode;

impl VisualizationNode {
    pub async fn run(state: &mut QueryState, gateway: &dyn TextGenerator) {
        // tool results arrive with their text marker already attached
        if state.intent == Some(Intent::Tool) && state.visualization_config.is_some() {
            return;
        }
        if state.error.is_some() {
            state.visualization_config = None;
            return;
        }
        if state.results.is_empty() {
            state.visualization_config = Some(VisualizationConfig::table());
            return;
        }

        let sample = &state.results[..state.results.len().min(SAMPLE_ROWS)];
        let columns = column_names(sample);

        let model_choice = Self::ask_model(&state.query, sample, &columns, gateway).await;
        state.visualization_config =
            Some(Self::resolve(&state.query, sample, &columns, model_choice));
    }

    async fn ask_model(
        query: &str,
        sample: &[Row],
        columns: &[String],
        gateway: &dyn TextGenerator,
    ) -> Option<VisualizationConfig> {
        let sample_json = serde_json::to_string_pretty(sample).unwrap_or_default();
        let comparison = COMPARISON_VOCAB.is_match(&query.to_lowercase());
        let prompt =
            prompts::visualization_prompt(query, &columns.join(", "), &sample_json, comparison);
        match gateway.generate(&prompt).await {
            Ok(reply) => {
                let parsed = parse_chart_reply(&reply);
                if parsed.is_none() {
                    warn!(reply = %reply, "unparseable visualization reply");
                }
                parsed
            }
            Err(err) => {
                warn!(error = %err, "visualization call failed");
                None
            }
        }
    }

    /// Applies the rating override on top of the model's choice, then falls
    /// back to a table when the model gave nothing usable.
    fn resolve(
        query: &str,
        sample: &[Row],
        columns: &[String],
        model_choice: Option<VisualizationConfig>,
    ) -> VisualizationConfig {
        let rating_query = RATING_VOCAB.is_match(&query.to_lowercase());
        let rating_column = columns.iter().find(|name| {
            let lowered = name.to_lowercase();
            (lowered.contains("score") || lowered.contains("rating") || lowered.contains("avg"))
                && classify_column(name, sample) == ColumnKind::Numeric
        });

        let model_chose_table = matches!(
            &model_choice,
            None | Some(VisualizationConfig { chart_type: ChartType::Table, .. })
        );

        if let (true, Some(y_axis), true) = (rating_query, rating_column, model_chose_table) {
            let x_axis = columns
                .iter()
                .find(|name| classify_column(name, sample) == ColumnKind::Identifier)
                .or_else(|| {
                    columns.iter().find(|name| {
                        classify_column(name, sample) != ColumnKind::Numeric
                    })
                })
                .cloned()
                .unwrap_or_else(|| columns[0].clone());
            debug!(x = %x_axis, y = %y_axis, "rating override applied");
            return VisualizationConfig::bar(x_axis, y_axis.clone());
        }

        model_choice.unwrap_or_else(VisualizationConfig::table)
    }
}

/// Parses `{"type": ..., "xAxis": ..., "yAxis": ..., "color": ...}` from a
/// possibly fenced reply. Unknown chart names fail the parse.
fn parse_chart_reply(reply: &str) -> Option<VisualizationConfig> {
    let cleaned = strip_code_fences(reply);
    let value: Value = serde_json::from_str(&cleaned).ok()?;
    let chart_type = match value.get("type").and_then(Value::as_str)? {
        "bar" => ChartType::Bar,
        "line" => ChartType::Line,
        "pie" => ChartType::Pie,
        "table" => ChartType::Table,
        _ => return None,
    };
    let axis = |key: &str| {
        value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(String::from)
    };
    Some(VisualizationConfig {
        chart_type,
        x_axis: axis("xAxis"),
        y_axis: axis("yAxis"),
        color: axis("color"),
    })
}

// ============================================================================
// Tests
// ============================================================================
