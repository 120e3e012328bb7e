//! External collaborators for the QueryMind pipeline.
//!
//! Defines the async traits the orchestration core depends on (text
//! generation, relational queries, vector retrieval, encyclopedia lookup,
//! conversational memory), their error taxonomies, the concrete HTTP/SQL
//! adapters, and scriptable mock implementations for tests.

pub mod database;
pub mod encyclopedia;
pub mod gateway;
pub mod memory;
pub mod mock;
pub mod vector;

pub use database::{QueryError, RelationalStore, SqlStore};
pub use encyclopedia::{EncyclopediaClient, LookupError, WikipediaClient};
pub use gateway::{GeminiGateway, GenerationError, TextGenerator};
pub use memory::{HttpMemoryStore, MemoryError, MemoryStore, NullMemory};
pub use mock::{MockEncyclopedia, MockGateway, MockMemory, MockSearcher, MockStore, StoredExchange};
pub use vector::{HttpVectorSearcher, RetrievalError, VectorSearcher};
