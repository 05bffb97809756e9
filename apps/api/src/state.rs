use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm::ChatCompletionPort;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Chat-completion capability behind the port trait; every agent session
    /// is built over this.
    pub llm: Arc<dyn ChatCompletionPort>,
    pub config: Config,
}
