use thiserror::Error;

/// Top-level error type for the QueryMind system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// QuerymindError` so that the `?` operator works seamlessly across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuerymindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for QuerymindError {
    fn from(err: toml::de::Error) -> Self {
        QuerymindError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QuerymindError {
    fn from(err: toml::ser::Error) -> Self {
        QuerymindError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QuerymindError {
    fn from(err: serde_json::Error) -> Self {
        QuerymindError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for QueryMind operations.
pub type Result<T> = std::result::Result<T, QuerymindError>;
