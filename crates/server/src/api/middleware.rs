//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, MatchedPath, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use tutorial_finder_core::{AuthError, AuthRequest, Identity};

use super::error::ErrorEnvelope;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
///
/// Requests are labelled with their route template when one matched.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    };

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Authentication middleware that validates requests using the configured authenticator.
///
/// Failures answer 401 (500 for a broken authenticator) with the error
/// envelope and never reach the handler.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let authenticator = state.authenticator();

    // Skip auth check if using NoneAuthenticator, but still insert anonymous identity
    if authenticator.method_name() == "none" {
        let mut request = request;
        request.extensions_mut().insert(Identity::anonymous());
        return Ok(next.run(request).await);
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    // Get source IP (default to localhost if not available)
    let source_ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };
    let path = request.uri().path().to_string();

    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            let mut request = request;
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(AuthError::NotAuthenticated) => {
            warn!(path = %path, "Request without credentials");
            AUTH_FAILURES_TOTAL.with_label_values(&["not_authenticated"]).inc();
            Err(ErrorEnvelope::new("Authentication failed", path)
                .with_status(StatusCode::UNAUTHORIZED))
        }
        Err(AuthError::InvalidCredentials(reason)) => {
            warn!(path = %path, "Rejected token: {}", reason);
            AUTH_FAILURES_TOTAL.with_label_values(&["invalid_credentials"]).inc();
            Err(ErrorEnvelope::new("Authentication failed", path)
                .with_status(StatusCode::UNAUTHORIZED))
        }
        Err(e) => {
            error!(path = %path, error = %e, "Authenticator failed");
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            Err(ErrorEnvelope::new(e.to_string(), path)
                .with_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Extractor for authenticated user ID.
///
/// Extracts the user_id from the Identity stored in request extensions.
/// Falls back to "anonymous" if no identity is present.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .extensions
            .get::<Identity>()
            .map(|id| id.user_id.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        std::future::ready(Ok(AuthUser(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;
    use tutorial_finder_core::{
        testing::{MockGameProvider, MockVideoProvider},
        AggregatorSettings, AuthConfig, AuthMethod, Authenticator, Config, GeneratorConfig,
        JwtAuthenticator, NoneAuthenticator, TutorialAggregator, TutorialGenerator,
    };

    const SECRET: &str = "test-secret";

    async fn user_handler(AuthUser(user_id): AuthUser) -> String {
        user_id
    }

    fn create_test_state(method: AuthMethod) -> Arc<AppState> {
        let config = Config {
            auth: AuthConfig {
                method,
                jwt_secret: Some(SECRET.to_string()),
            },
            server: Default::default(),
            providers: Default::default(),
            cache: Default::default(),
            generator: GeneratorConfig::default(),
        };

        let authenticator: Arc<dyn Authenticator> = match method {
            AuthMethod::None => Arc::new(NoneAuthenticator),
            AuthMethod::Jwt => Arc::new(JwtAuthenticator::new(SECRET)),
        };

        let aggregator = TutorialAggregator::new(
            Arc::new(MockVideoProvider::new()),
            Arc::new(MockGameProvider::new()),
            AggregatorSettings::default(),
        );
        let generator =
            TutorialGenerator::new(None, &config.generator, config.cache.enabled_ttl());

        Arc::new(AppState::new(
            config,
            authenticator,
            Arc::new(aggregator),
            Arc::new(generator),
        ))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(user_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_none_auth_allows_all_as_anonymous() {
        let app = app(create_test_state(AuthMethod::None));

        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_jwt_auth_valid() {
        let token = JwtAuthenticator::new(SECRET)
            .issue_token("user-42", Some("u@example.com"))
            .unwrap();
        let app = app(create_test_state(AuthMethod::Jwt));

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "user-42");
    }

    #[tokio::test]
    async fn test_jwt_auth_wrong_secret() {
        let token = JwtAuthenticator::new("other-secret")
            .issue_token("user-42", None)
            .unwrap();
        let app = app(create_test_state(AuthMethod::Jwt));

        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_jwt_auth_missing_token_uses_envelope() {
        let app = app(create_test_state(AuthMethod::Jwt));

        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["path"], "/test");
    }
}
