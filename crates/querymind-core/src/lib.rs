//! Shared foundation for QueryMind.
//!
//! Holds the top-level error type, TOML configuration, and the row/context
//! types passed between the pipeline and its external collaborators.

pub mod config;
pub mod error;
pub mod types;

pub use config::QuerymindConfig;
pub use error::{QuerymindError, Result};
pub use types::{serialize_context, MemoryContext, Row};
