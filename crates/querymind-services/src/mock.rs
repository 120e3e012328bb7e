//! Scriptable in-memory service implementations.
//!
//! Used by pipeline and API tests to script replies and to assert call
//! counts (e.g. "no gateway call when context is empty"). Each mock pops a
//! queued outcome per call and falls back to a benign default when the queue
//! runs dry.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use querymind_core::{MemoryContext, Row};

use crate::database::{QueryError, RelationalStore};
use crate::encyclopedia::{EncyclopediaClient, LookupError};
use crate::gateway::{GenerationError, TextGenerator};
use crate::memory::{MemoryError, MemoryStore};
use crate::vector::{RetrievalError, VectorSearcher};

// =============================================================================
// Gateway
// =============================================================================

/// Text generator that replays a scripted queue of outcomes.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, err: GenerationError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    /// Number of `generate` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGateway {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("no scripted reply".into())))
    }
}

// =============================================================================
// Relational store
// =============================================================================

/// Relational store that records executed SQL and replays scripted results.
pub struct MockStore {
    schema: String,
    schema_error: Mutex<Option<QueryError>>,
    results: Mutex<VecDeque<Result<Vec<Row>, QueryError>>>,
    executed: Mutex<Vec<String>>,
    schema_calls: AtomicUsize,
}

impl MockStore {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            schema_error: Mutex::new(None),
            results: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            schema_calls: AtomicUsize::new(0),
        }
    }

    /// Makes the next `fetch_schema` call fail.
    pub fn push_schema_error(&self, err: QueryError) {
        *self.schema_error.lock().unwrap() = Some(err);
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(Ok(rows));
    }

    pub fn push_error(&self, err: QueryError) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    /// SQL strings passed to `execute`, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn execute_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn schema_call_count(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new("Database Schema:\n\nTable: products\n  - product_id: text NOT NULL\n")
    }
}

#[async_trait]
impl RelationalStore for MockStore {
    async fn fetch_schema(&self) -> Result<String, QueryError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.schema_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.schema.clone())
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// =============================================================================
// Vector searcher
// =============================================================================

/// Vector searcher replaying scripted identifier lists.
#[derive(Default)]
pub struct MockSearcher {
    results: Mutex<VecDeque<Result<Vec<String>, RetrievalError>>>,
    calls: AtomicUsize,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ids(&self, ids: Vec<&str>) {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(ids.into_iter().map(String::from).collect()));
    }

    pub fn push_error(&self, err: RetrievalError) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorSearcher for MockSearcher {
    async fn search(&self, _text: &str, _top_k: usize) -> Result<Vec<String>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// =============================================================================
// Encyclopedia
// =============================================================================

/// Encyclopedia client replaying scripted lookup outcomes.
#[derive(Default)]
pub struct MockEncyclopedia {
    outcomes: Mutex<VecDeque<Result<String, LookupError>>>,
    calls: AtomicUsize,
}

impl MockEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_summary(&self, text: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, err: LookupError) {
        self.outcomes.lock().unwrap().push_back(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EncyclopediaClient for MockEncyclopedia {
    async fn lookup(&self, _topic: &str) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LookupError::NotFound))
    }
}

// =============================================================================
// Memory
// =============================================================================

/// One exchange recorded by [`MockMemory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredExchange {
    pub user_id: String,
    pub conversation_id: String,
    pub query: String,
    pub response: String,
}

/// Memory store with a fixed context and a record of stored exchanges.
#[derive(Default)]
pub struct MockMemory {
    context: Mutex<MemoryContext>,
    stored: Mutex<Vec<StoredExchange>>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: MemoryContext) -> Self {
        Self {
            context: Mutex::new(context),
            stored: Mutex::new(Vec::new()),
        }
    }

    pub fn stored_exchanges(&self) -> Vec<StoredExchange> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryStore for MockMemory {
    async fn get_context(
        &self,
        _user_id: &str,
        _conversation_id: &str,
    ) -> Result<MemoryContext, MemoryError> {
        Ok(self.context.lock().unwrap().clone())
    }

    async fn store_exchange(
        &self,
        user_id: &str,
        conversation_id: &str,
        query: &str,
        response: &str,
    ) -> Result<(), MemoryError> {
        self.stored.lock().unwrap().push(StoredExchange {
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
        });
        Ok(())
    }
}
