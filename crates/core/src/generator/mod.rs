//! LLM-backed tutorial generation.
//!
//! Generated tutorials are cached by prompt and options for the cache TTL.

mod llm;

pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage, OpenAiClient};

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::metrics::LLM_TOKENS;

const SYSTEM_PROMPT: &str =
    "You are a expert tutorial creator. Generate step-by-step guides with clear explanations.";

/// Generator configuration (`[generator]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (OpenAI-compatible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Per-request overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A generated tutorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTutorial {
    pub content: String,
    /// RFC 3339 generation time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("OpenAI API Error: {0}")]
    Llm(#[from] LlmError),
}

/// Generates tutorials from free-form prompts.
pub struct TutorialGenerator {
    client: Option<Arc<dyn LlmClient>>,
    temperature: f32,
    max_tokens: u32,
    /// Absent when `[cache]` is disabled.
    cache: Option<ResponseCache<GeneratedTutorial>>,
}

impl TutorialGenerator {
    /// Results are cached for `cache_ttl`; `None` disables caching.
    pub fn new(
        client: Option<Arc<dyn LlmClient>>,
        config: &GeneratorConfig,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            cache: cache_ttl.map(|ttl| ResponseCache::new("generator", ttl)),
        }
    }

    /// Build a generator backed by the OpenAI client.
    ///
    /// Without an API key the generator still exists but every call fails
    /// with [`LlmError::NotConfigured`].
    pub fn from_config(
        config: &GeneratorConfig,
        cache_ttl: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let client = match config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let mut client = OpenAiClient::new(
                    key,
                    config.model.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?;
                if let Some(base) = &config.api_base {
                    client = client.with_api_base(base.clone());
                }
                info!("Tutorial generator using {} via openai", config.model);
                Some(Arc::new(client) as Arc<dyn LlmClient>)
            }
            None => {
                info!("Tutorial generator not configured (no API key)");
                None
            }
        };
        Ok(Self::new(client, config, cache_ttl))
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Drop expired cached tutorials, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.purge_expired().await,
            None => 0,
        }
    }

    /// Generate (or return the cached) tutorial for a prompt.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedTutorial, GeneratorError> {
        if prompt.trim().is_empty() {
            return Err(GeneratorError::EmptyPrompt);
        }

        let key = cache_key(prompt, options);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key).await {
                debug!("Returning cached tutorial");
                return Ok(cached);
            }
        }

        let client = self.client.as_ref().ok_or(LlmError::NotConfigured)?;

        let request = CompletionRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(options.temperature.unwrap_or(self.temperature))
            .with_max_tokens(options.max_tokens.unwrap_or(self.max_tokens));

        let response = client.complete(request).await?;

        LLM_TOKENS
            .with_label_values(&[client.provider(), "input"])
            .inc_by(response.usage.input_tokens as u64);
        LLM_TOKENS
            .with_label_values(&[client.provider(), "output"])
            .inc_by(response.usage.output_tokens as u64);

        let tutorial = GeneratedTutorial {
            content: response.text,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        if let Some(cache) = &self.cache {
            cache.insert(key, tutorial.clone()).await;
        }

        Ok(tutorial)
    }
}

fn cache_key(prompt: &str, options: &GenerationOptions) -> String {
    let options_json = serde_json::to_string(options).unwrap_or_default();
    format!("tutorial:{}:{}", prompt, options_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmClient;

    fn generator(client: &Arc<MockLlmClient>) -> TutorialGenerator {
        TutorialGenerator::new(
            Some(Arc::clone(client) as Arc<dyn LlmClient>),
            &GeneratorConfig::default(),
            Some(Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_cache_key_includes_options() {
        assert_eq!(
            cache_key("beat malenia", &GenerationOptions::default()),
            "tutorial:beat malenia:{}"
        );
        let options = GenerationOptions {
            temperature: None,
            max_tokens: Some(200),
        };
        assert_eq!(cache_key("p", &options), r#"tutorial:p:{"maxTokens":200}"#);
    }

    #[tokio::test]
    async fn test_generate_uses_system_prompt_and_defaults() {
        let client = Arc::new(MockLlmClient::new());
        client.set_response("Step 1: dodge").await;

        let tutorial = generator(&client)
            .generate("beat malenia", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(tutorial.content, "Step 1: dodge");
        assert!(chrono::DateTime::parse_from_rfc3339(&tutorial.timestamp).is_ok());

        let requests = client.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(requests[0].prompt, "beat malenia");
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].max_tokens, 1500);
    }

    #[tokio::test]
    async fn test_repeat_prompt_served_from_cache() {
        let client = Arc::new(MockLlmClient::new());
        let generator = generator(&client);

        let first = generator
            .generate("p", &GenerationOptions::default())
            .await
            .unwrap();
        let second = generator
            .generate("p", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(client.recorded_requests().await.len(), 1);

        let other = GenerationOptions {
            temperature: Some(0.1),
            max_tokens: None,
        };
        generator.generate("p", &other).await.unwrap();
        assert_eq!(client.recorded_requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_prompt_regenerated_without_cache() {
        let client = Arc::new(MockLlmClient::new());
        let generator = TutorialGenerator::new(
            Some(Arc::clone(&client) as Arc<dyn LlmClient>),
            &GeneratorConfig::default(),
            None,
        );

        for _ in 0..2 {
            generator
                .generate("p", &GenerationOptions::default())
                .await
                .unwrap();
        }
        assert_eq!(client.recorded_requests().await.len(), 2);
        assert_eq!(generator.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_purge_drops_expired_tutorials() {
        let client = Arc::new(MockLlmClient::new());
        let generator = TutorialGenerator::new(
            Some(Arc::clone(&client) as Arc<dyn LlmClient>),
            &GeneratorConfig::default(),
            Some(Duration::from_millis(20)),
        );

        for prompt in ["a", "b", "c"] {
            generator
                .generate(prompt, &GenerationOptions::default())
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(generator.purge_expired().await, 3);
        assert_eq!(generator.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_errors_are_prefixed() {
        let client = Arc::new(MockLlmClient::new());
        client
            .set_next_error(LlmError::Api {
                status: 429,
                message: "rate limited".to_string(),
            })
            .await;

        let err = generator(&client)
            .generate("p", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API Error: API error: 429 - rate limited");
    }

    #[tokio::test]
    async fn test_unconfigured_and_empty_prompt() {
        let generator = TutorialGenerator::new(
            None,
            &GeneratorConfig::default(),
            Some(Duration::from_secs(60)),
        );
        assert!(!generator.is_configured());

        let err = generator
            .generate("p", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Llm(LlmError::NotConfigured)));

        let err = generator
            .generate("  ", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyPrompt));
    }
}
