//! Orchestration core for QueryMind.
//!
//! A request-scoped state machine that classifies intent, dispatches to one
//! of three query-handling strategies, converges the tabular branches into
//! shared visualization and insight stages, and always terminates with a
//! well-formed, non-throwing [`state::QueryState`].

pub mod analytical;
pub mod engine;
pub mod enhancer;
pub mod insight;
pub mod prompts;
pub mod router;
pub mod semantic;
pub mod state;
pub mod text;
pub mod tool;
pub mod visualization;

pub use engine::{Engine, NodeId, PipelineOptions, PipelineServices};
pub use enhancer::ContextEnhancer;
pub use router::IntentRouter;
pub use state::{ChartType, Intent, QueryState, VisualizationConfig};
