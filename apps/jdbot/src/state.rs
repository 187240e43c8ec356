use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::schema::FieldSchema;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Completion backend. `LlmClient` in production, a scripted fake in tests.
    pub completion: Arc<dyn CompletionService>,
    pub schema: FieldSchema,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            sessions: SessionStore::with_idle_timeout(chrono::Duration::minutes(
                config.session_idle_minutes,
            )),
            config,
            completion,
            schema: FieldSchema::default(),
        }
    }
}
