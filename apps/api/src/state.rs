use std::sync::Arc;

use tokio::sync::Mutex;

use crate::assistant::AssistantSession;
use crate::llm_client::LlmClient;
use crate::storage::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Injected storage port. Postgres in production, in-memory in tests.
    pub store: Arc<dyn RecordStore>,
    pub llm: LlmClient,
    /// The assistant session, created lazily on the first chat turn and
    /// shared across turns from then on.
    pub assistant: Arc<Mutex<Option<AssistantSession>>>,
}
