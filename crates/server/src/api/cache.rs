//! HTTP response cache for the read-only lookup routes.
//!
//! Keyed by `METHOD path?query`. Only successful responses are stored, and a
//! handler can opt a response out with `Cache-Control: no-store`.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::state::AppState;

/// Header reporting whether the response came from the cache.
pub const X_CACHE: &str = "x-cache";

/// A stored response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static("hit"));
        response
    }
}

/// Cache key for a request.
pub fn cache_key(method: &Method, uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{} {}", method, target)
}

fn is_no_store(response: &Response) -> bool {
    response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("no-store"))
}

/// Serve GET requests from the response cache, filling it on success.
pub async fn response_cache_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let cache = match state.response_cache() {
        Some(cache) if request.method() == Method::GET => Arc::clone(cache),
        _ => return next.run(request).await,
    };

    let key = cache_key(request.method(), request.uri());
    if let Some(cached) = cache.get(&key).await {
        debug!(key = %key, "Serving cached response");
        return cached.into_response();
    }

    let mut response = next.run(request).await;
    if !response.status().is_success() || is_no_store(&response) {
        return response;
    }

    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static("miss"));

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to buffer response for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    cache
        .insert(
            key,
            CachedResponse {
                status: parts.status,
                content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
                body: body.clone(),
            },
        )
        .await;

    Response::from_parts(parts, Body::from(body))
}
