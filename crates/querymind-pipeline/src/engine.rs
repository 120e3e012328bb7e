//! The pipeline engine: an explicit node graph over [`QueryState`].
//!
//! Nodes are plain enum variants and the routing table is a total function,
//! so every possible walk is visible in one place. [`Engine::run`] is
//! infallible by contract: whatever happens inside the nodes, the caller
//! always gets back a well-formed state.

use std::sync::Arc;

use tracing::{debug, info};

use querymind_core::MemoryContext;
use querymind_services::{EncyclopediaClient, RelationalStore, TextGenerator, VectorSearcher};

use crate::analytical::AnalyticalNode;
use crate::insight::InsightNode;
use crate::router::IntentRouter;
use crate::semantic::SemanticNode;
use crate::state::{Intent, QueryState};
use crate::tool::{RetryPolicy, ToolNode};
use crate::visualization::VisualizationNode;

// ============================================================================
// Node graph
// ============================================================================

/// Every stage a request can visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Router,
    Analytical,
    Semantic,
    Tool,
    Visualization,
    Insight,
    Terminal,
}

/// The complete transition table. Total over `(NodeId, Intent)`, so adding a
/// node without routing it is a compile error.
pub fn next_node(current: NodeId, intent: Intent) -> NodeId {
    match current {
        NodeId::Router => match intent {
            Intent::Analytical => NodeId::Analytical,
            Intent::Semantic => NodeId::Semantic,
            Intent::Tool => NodeId::Tool,
            Intent::Conversational => NodeId::Terminal,
        },
        NodeId::Analytical | NodeId::Semantic => NodeId::Visualization,
        NodeId::Tool => NodeId::Terminal,
        NodeId::Visualization => NodeId::Insight,
        NodeId::Insight => NodeId::Terminal,
        NodeId::Terminal => NodeId::Terminal,
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The external services the nodes call into.
#[derive(Clone)]
pub struct PipelineServices {
    pub gateway: Arc<dyn TextGenerator>,
    pub store: Arc<dyn RelationalStore>,
    pub searcher: Arc<dyn VectorSearcher>,
    pub encyclopedia: Arc<dyn EncyclopediaClient>,
}

/// Tunables threaded from configuration into the nodes.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub retry: RetryPolicy,
    pub summary_max_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { top_k: 5, retry: RetryPolicy::default(), summary_max_chars: 500 }
    }
}

pub struct Engine {
    services: PipelineServices,
    options: PipelineOptions,
}

impl Engine {
    pub fn new(services: PipelineServices, options: PipelineOptions) -> Self {
        Self { services, options }
    }

    /// Runs one question through the graph. Never fails and never panics on
    /// malformed model output; the worst outcome is a state with `error` set
    /// and empty results.
    pub async fn run(&self, query: &str, memory_context: MemoryContext) -> QueryState {
        let mut state = QueryState::new(query, memory_context);

        let intent = IntentRouter::classify(
            &state.query,
            &state.memory_context,
            self.services.gateway.as_ref(),
        )
        .await;
        state.intent = Some(intent);
        info!(intent = %intent, "question classified");

        let mut node = next_node(NodeId::Router, intent);
        while node != NodeId::Terminal {
            debug!(node = ?node, "entering node");
            match node {
                NodeId::Analytical => {
                    AnalyticalNode::run(
                        &mut state,
                        self.services.gateway.as_ref(),
                        self.services.store.as_ref(),
                    )
                    .await;
                }
                NodeId::Semantic => {
                    SemanticNode::run(
                        &mut state,
                        self.services.gateway.as_ref(),
                        self.services.searcher.as_ref(),
                        self.services.store.as_ref(),
                        self.options.top_k,
                    )
                    .await;
                }
                NodeId::Tool => {
                    ToolNode::run(
                        &mut state,
                        self.services.gateway.as_ref(),
                        self.services.encyclopedia.as_ref(),
                        self.options.retry,
                        self.options.summary_max_chars,
                    )
                    .await;
                }
                NodeId::Visualization => {
                    VisualizationNode::run(&mut state, self.services.gateway.as_ref()).await;
                }
                NodeId::Insight => {
                    InsightNode::run(&mut state, self.services.gateway.as_ref()).await;
                }
                NodeId::Router | NodeId::Terminal => unreachable!("not re-enterable"),
            }
            node = next_node(node, intent);
        }

        info!(
            intent = %intent,
            rows = state.results.len(),
            failed = state.error.is_some(),
            "pipeline finished"
        );
        state
    }
}

// ============================================================================
// Tests
// ============================================================================
