use std::sync::Arc;

use crate::analysis::retry::RetryPolicy;
use crate::config::Config;
use crate::llm_client::ModelClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; nothing here is per-user.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable model backend. Default: GeminiClient. Tests inject a fake.
    pub model: Arc<dyn ModelClient>,
    pub retry_policy: RetryPolicy,
}
