use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::generator::GeneratorConfig;
use crate::providers::{SteamConfig, YouTubeConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Fill unset credentials from their conventional environment variables.
    ///
    /// `lookup` resolves a variable name; empty values count as unset.
    pub fn apply_credential_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, var: &str| {
            if slot.as_deref().map_or(true, str::is_empty) {
                *slot = lookup(var).filter(|v| !v.is_empty());
            }
        };

        fill(&mut self.providers.youtube.api_key, "YOUTUBE_API_KEY");
        fill(&mut self.providers.steam.api_key, "STEAM_API_KEY");
        fill(&mut self.generator.api_key, "OPENAI_API_KEY");
        fill(&mut self.auth.jwt_secret, "JWT_SECRET");
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// HMAC secret for `jwt`. Falls back to `JWT_SECRET`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Jwt,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Jwt => "jwt",
        }
    }
}

/// Content provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Timeout per outbound call, also bounding each source in a search.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub steam: SteamConfig,
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout(),
            youtube: YouTubeConfig::default(),
            steam: SteamConfig::default(),
        }
    }
}

fn default_provider_timeout() -> u64 {
    10
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// The TTL to cache with, or `None` when caching is disabled.
    pub fn enabled_ttl(&self) -> Option<Duration> {
        self.enabled.then(|| self.ttl())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub providers: SanitizedProvidersConfig,
    pub cache: CacheConfig,
    pub generator: SanitizedGeneratorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub jwt_secret_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub timeout_secs: u64,
    pub youtube: SanitizedYouTubeConfig,
    pub steam: SanitizedSteamConfig,
}

/// Sanitized YouTube config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYouTubeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_results: u32,
    pub language: String,
    pub api_key_configured: bool,
}

/// Sanitized Steam config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSteamConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_api_base_url: Option<String>,
    pub game_count: u32,
    pub guides_per_game: u32,
    pub api_key_configured: bool,
}

/// Sanitized generator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let youtube = &config.providers.youtube;
        let steam = &config.providers.steam;
        let generator = &config.generator;

        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                jwt_secret_configured: is_set(&config.auth.jwt_secret),
            },
            server: config.server.clone(),
            providers: SanitizedProvidersConfig {
                timeout_secs: config.providers.timeout_secs,
                youtube: SanitizedYouTubeConfig {
                    base_url: youtube.base_url.clone(),
                    max_results: youtube.max_results,
                    language: youtube.language.clone(),
                    api_key_configured: is_set(&youtube.api_key),
                },
                steam: SanitizedSteamConfig {
                    store_base_url: steam.store_base_url.clone(),
                    web_api_base_url: steam.web_api_base_url.clone(),
                    game_count: steam.game_count,
                    guides_per_game: steam.guides_per_game,
                    api_key_configured: is_set(&steam.api_key),
                },
            },
            cache: config.cache.clone(),
            generator: SanitizedGeneratorConfig {
                model: generator.model.clone(),
                api_base: generator.api_base.clone(),
                temperature: generator.temperature,
                max_tokens: generator.max_tokens,
                timeout_secs: generator.timeout_secs,
                api_key_configured: is_set(&generator.api_key),
            },
        }
    }
}
