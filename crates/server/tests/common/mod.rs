//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock providers injected, enabling E2E testing without reaching
//! YouTube, Steam or OpenAI.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use tutorial_finder_core::{
    testing::{MockGameProvider, MockLlmClient, MockVideoProvider},
    AggregatorSettings, AuthConfig, AuthMethod, Authenticator, CacheConfig, Config,
    GameProvider, GeneratorConfig, JwtAuthenticator, LlmClient, NoneAuthenticator,
    ProvidersConfig, ServerConfig, TutorialAggregator, TutorialGenerator, VideoProvider,
};

/// Re-export fixtures for test convenience
pub use tutorial_finder_core::testing::fixtures;

/// Secret used when the fixture runs with JWT auth.
pub const JWT_SECRET: &str = "e2e-secret";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - YouTube video search (MockVideoProvider)
/// - Steam games and guides (MockGameProvider)
/// - Completions (MockLlmClient)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///     fixture.youtube.set_videos(vec![fixtures::video("v1", "Guide")]).await;
///
///     let response = fixture.get("/api/search?q=malenia").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock YouTube provider - configure videos and failures
    pub youtube: Arc<MockVideoProvider>,
    /// Mock Steam provider - configure games and guides
    pub steam: Arc<MockGameProvider>,
    /// Mock LLM - configure generated content
    pub llm: Arc<MockLlmClient>,
    /// Token issuer matching the fixture's JWT secret
    pub tokens: JwtAuthenticator,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `x-cache` header, if present.
    pub fn cache_status(&self) -> Option<&str> {
        self.headers.get("x-cache").and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let youtube = Arc::new(if test_config.youtube_unconfigured {
            MockVideoProvider::unconfigured()
        } else {
            MockVideoProvider::new()
        });
        let steam = Arc::new(MockGameProvider::new());
        let llm = Arc::new(MockLlmClient::new());

        let auth_method = if test_config.jwt_auth {
            AuthMethod::Jwt
        } else {
            AuthMethod::None
        };

        let config = Config {
            auth: AuthConfig {
                method: auth_method,
                jwt_secret: test_config.jwt_auth.then(|| JWT_SECRET.to_string()),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            providers: ProvidersConfig::default(),
            cache: CacheConfig {
                enabled: test_config.enable_cache,
                ..Default::default()
            },
            generator: GeneratorConfig::default(),
        };

        let authenticator: Arc<dyn Authenticator> = match auth_method {
            AuthMethod::None => Arc::new(NoneAuthenticator),
            AuthMethod::Jwt => Arc::new(JwtAuthenticator::new(JWT_SECRET)),
        };

        let aggregator = TutorialAggregator::new(
            Arc::clone(&youtube) as Arc<dyn VideoProvider>,
            Arc::clone(&steam) as Arc<dyn GameProvider>,
            AggregatorSettings::default(),
        );

        let generator = TutorialGenerator::new(
            Some(Arc::clone(&llm) as Arc<dyn LlmClient>),
            &config.generator,
            config.cache.enabled_ttl(),
        );

        // Create app state with mocks
        let state = Arc::new(tutorial_finder_server::state::AppState::new(
            config,
            authenticator,
            Arc::new(aggregator),
            Arc::new(generator),
        ));

        // Create router
        let router = tutorial_finder_server::api::create_router(state);

        Self {
            router,
            youtube,
            steam,
            llm,
            tokens: JwtAuthenticator::new(JWT_SECRET),
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a POST request with JSON body and a bearer token.
    pub async fn post_with_token(&self, path: &str, body: Value, token: &str) -> TestResponse {
        self.request("POST", path, Some(body), Some(token)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Gate generation behind JWT auth
    pub jwt_auth: bool,
    /// Enable the HTTP response cache
    pub enable_cache: bool,
    /// Make the YouTube mock report a missing API key
    pub youtube_unconfigured: bool,
}

impl TestConfig {
    /// Create config with JWT auth enabled.
    pub fn with_jwt() -> Self {
        Self {
            jwt_auth: true,
            ..Default::default()
        }
    }

    /// Create config with the response cache enabled.
    pub fn with_cache() -> Self {
        Self {
            enable_cache: true,
            ..Default::default()
        }
    }
}

/// Collects formatted log output of the current thread.
///
/// Tests run on the current-thread runtime, so a thread-default subscriber
/// sees every event emitted while handling a request.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Captured lines at WARN or ERROR level.
    pub fn problems(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(" WARN ") || line.contains("ERROR "))
            .map(String::from)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
