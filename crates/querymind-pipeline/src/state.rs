//! Request-scoped pipeline state.
//!
//! One [`QueryState`] is created per question and threaded through every
//! node. Nodes mutate only the fields they own; a populated `error` field
//! means the current strategy failed and downstream stages should degrade
//! rather than abort.

use serde::{Deserialize, Serialize};

use querymind_core::{MemoryContext, Row};

// ============================================================================
// Intent
// ============================================================================

/// The four question categories the router can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Aggregations and rankings answered with generated SQL.
    Analytical,
    /// Descriptive product search answered via vector retrieval.
    Semantic,
    /// External lookups and term definitions.
    Tool,
    /// Greetings, small talk, and anything out of scope.
    Conversational,
}

impl Intent {
    /// Parses a model-produced label, tolerating case and surrounding noise.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "analytical" => Some(Self::Analytical),
            "semantic" => Some(Self::Semantic),
            "tool" => Some(Self::Tool),
            "conversational" => Some(Self::Conversational),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytical => "analytical",
            Self::Semantic => "semantic",
            Self::Tool => "tool",
            Self::Conversational => "conversational",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Visualization config
// ============================================================================

/// Chart families the frontend knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Table,
    Text,
}

/// Rendering hint attached to tabular and textual results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub color: Option<String>,
}

impl VisualizationConfig {
    pub fn table() -> Self {
        Self { chart_type: ChartType::Table, x_axis: None, y_axis: None, color: None }
    }

    pub fn text() -> Self {
        Self { chart_type: ChartType::Text, x_axis: None, y_axis: None, color: None }
    }

    pub fn bar(x_axis: impl Into<String>, y_axis: impl Into<String>) -> Self {
        Self {
            chart_type: ChartType::Bar,
            x_axis: Some(x_axis.into()),
            y_axis: Some(y_axis.into()),
            color: None,
        }
    }

    pub fn with_chart(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }
}

// ============================================================================
// Query state
// ============================================================================

/// Everything the pipeline knows about one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    /// The user's question, verbatim.
    pub query: String,
    /// Set once by the router and never changed afterwards.
    pub intent: Option<Intent>,
    /// The generated SQL. Only the analytical strategy sets this, and it is
    /// preserved even when execution fails so callers can inspect it.
    pub sql_query: Option<String>,
    /// Tabular results. Always present, possibly empty. Never null.
    pub results: Vec<Row>,
    pub visualization_config: Option<VisualizationConfig>,
    /// Prior-conversation context supplied by the memory layer.
    #[serde(default)]
    pub memory_context: MemoryContext,
    /// Schema description fetched for SQL generation.
    #[serde(default)]
    pub db_schema: String,
    /// Human-readable failure description. Raw driver text never lands here.
    pub error: Option<String>,
    /// Synthesized bullet-point insights, when the results warranted them.
    pub insights: Option<String>,
}

impl QueryState {
    pub fn new(query: impl Into<String>, memory_context: MemoryContext) -> Self {
        Self {
            query: query.into(),
            intent: None,
            sql_query: None,
            results: Vec::new(),
            visualization_config: None,
            memory_context,
            db_schema: String::new(),
            error: None,
            insights: None,
        }
    }

    /// Derives the top-level message shown alongside the payload.
    pub fn summary_message(&self) -> String {
        if self.intent == Some(Intent::Conversational) {
            return "Hello! I can answer questions about the product catalog: sales \
                    rankings, category performance, product search, and term definitions. \
                    What would you like to know?"
                .to_string();
        }
        if let Some(error) = &self.error {
            return format!("Sorry, I ran into a problem: {error}");
        }
        if self.results.is_empty() {
            "No matching data was found for your question.".to_string()
        } else {
            let n = self.results.len();
            let noun = if n == 1 { "result" } else { "results" };
            format!("Found {n} {noun} for your question.")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
