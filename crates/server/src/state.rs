use std::sync::Arc;

use tutorial_finder_core::{
    Authenticator, Config, ResponseCache, SanitizedConfig, TutorialAggregator, TutorialGenerator,
};

use crate::api::CachedResponse;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    aggregator: Arc<TutorialAggregator>,
    generator: Arc<TutorialGenerator>,
    response_cache: Option<Arc<ResponseCache<CachedResponse>>>,
}

impl AppState {
    /// Build the state. The response cache exists only when `[cache]` is enabled.
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        aggregator: Arc<TutorialAggregator>,
        generator: Arc<TutorialGenerator>,
    ) -> Self {
        let response_cache = config
            .cache
            .enabled_ttl()
            .map(|ttl| Arc::new(ResponseCache::new("responses", ttl)));

        Self {
            config,
            authenticator,
            aggregator,
            generator,
            response_cache,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn aggregator(&self) -> &TutorialAggregator {
        self.aggregator.as_ref()
    }

    pub fn generator(&self) -> &TutorialGenerator {
        self.generator.as_ref()
    }

    pub fn response_cache(&self) -> Option<&Arc<ResponseCache<CachedResponse>>> {
        self.response_cache.as_ref()
    }
}
