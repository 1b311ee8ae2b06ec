//! Content provider adapters for YouTube and Steam.
//!
//! Each adapter translates one external API into [`NormalizedResult`]s.
//! Adapters check their credential on every call so that a missing key
//! degrades only the source that needs it.

mod guide_id;
mod steam;
mod youtube;

pub use guide_id::{decode_guide_id, encode_guide_id, is_guide_id, GUIDE_ID_PREFIX};
pub use steam::{SteamClient, SteamConfig};
pub use youtube::{DurationBucket, YouTubeClient, YouTubeConfig};

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Response;

use crate::metrics::{EXTERNAL_SERVICE_DURATION, EXTERNAL_SERVICE_REQUESTS};
use crate::tutorial::{NormalizedResult, TutorialError};

/// Options for a video search.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSearchOptions {
    pub max_results: u32,
    pub language: String,
    pub duration: DurationBucket,
}

impl Default for VideoSearchOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            language: "en".to_string(),
            duration: DurationBucket::Any,
        }
    }
}

/// A provider of video tutorials.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Provider name used in error entries.
    fn name(&self) -> &str;

    /// Search for tutorial videos.
    async fn search_videos(
        &self,
        query: &str,
        options: &VideoSearchOptions,
    ) -> Result<Vec<NormalizedResult>, TutorialError>;

    /// Fetch a single video with statistics.
    async fn get_video_details(&self, video_id: &str) -> Result<NormalizedResult, TutorialError>;
}

/// A provider of games and community guides.
#[async_trait]
pub trait GameProvider: Send + Sync {
    /// Provider name used in error entries.
    fn name(&self) -> &str;

    /// Search the store for games matching the query.
    async fn search_games(
        &self,
        query: &str,
        count: u32,
    ) -> Result<Vec<NormalizedResult>, TutorialError>;

    /// Fetch store details for one app.
    async fn get_game_details(&self, app_id: &str) -> Result<NormalizedResult, TutorialError>;

    /// Fetch the community guides for one app.
    ///
    /// Guide ids follow the `guide_<appId>_<n>` scheme.
    async fn get_game_guides(&self, app_id: &str) -> Result<Vec<NormalizedResult>, TutorialError>;
}

/// Map a transport failure into a provider error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> TutorialError {
    if err.is_timeout() {
        TutorialError::provider(provider, "request timed out")
    } else {
        TutorialError::provider(provider, err.to_string())
    }
}

/// Longest upstream error body carried into a provider error.
const MAX_UPSTREAM_MESSAGE_CHARS: usize = 200;

/// Reject non-2xx responses, summarising the upstream body as the message.
pub(crate) async fn check_status(
    provider: &str,
    response: Response,
) -> Result<Response, TutorialError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match upstream_message(&body) {
        Some(detail) => format!("HTTP {}: {}", status.as_u16(), detail),
        None => format!("HTTP {}", status.as_u16()),
    };
    Err(TutorialError::provider(provider, message))
}

/// The useful part of an error body: `error.message` (or `message`) of a
/// JSON body, otherwise the body on one line, capped in length.
fn upstream_message(body: &str) -> Option<String> {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let text = json
        .as_ref()
        .and_then(|v| v.pointer("/error/message").or_else(|| v.get("message")))
        .and_then(|v| v.as_str())
        .unwrap_or(body);

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= MAX_UPSTREAM_MESSAGE_CHARS {
        return Some(text);
    }
    let mut cut: String = text.chars().take(MAX_UPSTREAM_MESSAGE_CHARS).collect();
    cut.push_str("...");
    Some(cut)
}

/// Record the outcome of one outbound call.
pub(crate) fn observe_request<T>(
    service: &str,
    operation: &str,
    started: Instant,
    result: &Result<T, TutorialError>,
) {
    let status = if result.is_ok() { "success" } else { "error" };
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(started.elapsed().as_secs_f64());
}
