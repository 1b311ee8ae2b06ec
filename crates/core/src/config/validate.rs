use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// YouTube rejects larger page sizes.
const YOUTUBE_MAX_RESULTS_LIMIT: u32 = 50;

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Server port is not 0
/// - `jwt` auth has a secret
/// - Provider timeout and page sizes are usable
/// - Cache TTL is not 0 while the cache is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Jwt
        && config.auth.jwt_secret.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.jwt_secret is required when auth.method = \"jwt\"".to_string(),
        ));
    }

    let providers = &config.providers;
    if providers.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "providers.timeout_secs cannot be 0".to_string(),
        ));
    }
    if providers.youtube.max_results == 0
        || providers.youtube.max_results > YOUTUBE_MAX_RESULTS_LIMIT
    {
        return Err(ConfigError::ValidationError(format!(
            "providers.youtube.max_results must be between 1 and {}",
            YOUTUBE_MAX_RESULTS_LIMIT
        )));
    }
    if providers.steam.game_count == 0 {
        return Err(ConfigError::ValidationError(
            "providers.steam.game_count cannot be 0".to_string(),
        ));
    }

    if config.cache.enabled && config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0 while the cache is enabled".to_string(),
        ));
    }

    Ok(())
}
