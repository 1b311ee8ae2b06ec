//! Mock LLM client for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::generator::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Mock implementation of the LlmClient trait.
///
/// Answers every request with the configured text and records the requests.
#[derive(Debug)]
pub struct MockLlmClient {
    response: Arc<RwLock<String>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
    /// If set, the next completion will fail with this error.
    next_error: Arc<RwLock<Option<LlmError>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            response: Arc::new(RwLock::new("Mock tutorial".to_string())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_response(&self, text: impl Into<String>) {
        *self.response.write().await = text.into();
    }

    pub async fn set_next_error(&self, error: LlmError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.write().await.push(request.clone());
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let text = self.response.read().await.clone();
        Ok(CompletionResponse {
            usage: LlmUsage {
                input_tokens: request.prompt.len() as u32,
                output_tokens: text.len() as u32,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
