//! Shared state handed to every route

use std::sync::Arc;

use crate::config::Config;
use crate::llm::ProviderRegistry;
use crate::middleware::RateLimiter;
use crate::relay::RelayOrchestrator;
use crate::store::ConversationStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub providers: ProviderRegistry,
    pub orchestrator: RelayOrchestrator,
    pub limiter: Arc<RateLimiter>,
    /// Expected `X-API-Key` value; `None` disables the check
    pub api_key: Option<Arc<str>>,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn ConversationStore>,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            orchestrator: RelayOrchestrator::new(
                Arc::clone(&store),
                config.partial_response_policy,
            ),
            store,
            providers,
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
            api_key: config.server_api_key.as_deref().map(Arc::from),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}
