use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides; nested keys are separated by `__`.
const ENV_PREFIX: &str = "TUTORIAL_FINDER_";

/// Load configuration from file with environment variable overrides.
///
/// Credentials left unset fall back to their conventional variables
/// (`YOUTUBE_API_KEY`, `STEAM_API_KEY`, `OPENAI_API_KEY`, `JWT_SECRET`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.apply_credential_fallbacks(|name| std::env::var(name).ok());

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
