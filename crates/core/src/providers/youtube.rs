//! YouTube Data API v3 client.
//!
//! Requires an API key. Search costs 100 quota units per call, so the
//! result count is kept small.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, observe_request, transport_error, VideoProvider, VideoSearchOptions};
use crate::tutorial::{ContentType, NormalizedResult, SourceKind, TutorialError};

const PROVIDER: &str = "youtube";
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Term appended to every search so results lean towards guides.
const QUERY_QUALIFIER: &str = "tutorial";

/// YouTube client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key. Falls back to `YOUTUBE_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (default: https://www.googleapis.com/youtube/v3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Videos per search.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Relevance language for searches.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_max_results() -> u32 {
    5
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_results: default_max_results(),
            language: default_language(),
        }
    }
}

/// The `videoDuration` filter of the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DurationBucket {
    #[default]
    Any,
    Short,
    Medium,
    Long,
}

impl DurationBucket {
    /// Pick the bucket for a caller's length bounds in seconds.
    pub fn from_bounds(min_secs: Option<u32>, max_secs: Option<u32>) -> Self {
        match (min_secs, max_secs) {
            (_, Some(max)) if max <= 300 => DurationBucket::Short,
            (Some(min), _) if min >= 900 => DurationBucket::Long,
            (Some(min), _) if min >= 240 => DurationBucket::Medium,
            (_, Some(max)) if max <= 1200 => DurationBucket::Medium,
            _ => DurationBucket::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBucket::Any => "any",
            DurationBucket::Short => "short",
            DurationBucket::Medium => "medium",
            DurationBucket::Long => "long",
        }
    }
}

/// YouTube Data API client.
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    /// Create a new client. A missing key only fails at call time.
    pub fn new(config: YouTubeConfig, timeout: Duration) -> Result<Self, TutorialError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            TutorialError::Configuration(format!("Failed to build YouTube HTTP client: {}", e))
        })?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, TutorialError> {
        self.api_key.as_deref().ok_or_else(|| {
            TutorialError::Configuration("YouTube API key is not configured".to_string())
        })
    }

    async fn fetch_search(
        &self,
        query: &str,
        options: &VideoSearchOptions,
    ) -> Result<Vec<NormalizedResult>, TutorialError> {
        let api_key = self.api_key()?;
        let url = format!("{}/search", self.base_url);
        let q = format!("{} {}", query, QUERY_QUALIFIER);
        let max_results = options.max_results.to_string();

        debug!(
            "YouTube search: q='{}', max_results={}, duration={}",
            q,
            options.max_results,
            options.duration.as_str()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", q.as_str()),
                ("maxResults", max_results.as_str()),
                ("relevanceLanguage", options.language.as_str()),
                ("videoDuration", options.duration.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;

        let search: SearchResponse = response.json().await.map_err(|e| {
            TutorialError::provider(PROVIDER, format!("Failed to parse search response: {}", e))
        })?;

        Ok(search
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(item.snippet.into_result(video_id))
            })
            .collect())
    }

    async fn fetch_details(&self, video_id: &str) -> Result<NormalizedResult, TutorialError> {
        let api_key = self.api_key()?;
        let url = format!("{}/videos", self.base_url);

        debug!("YouTube get video: id={}", video_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet,contentDetails,statistics"),
                ("id", video_id),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;

        let videos: VideosResponse = response.json().await.map_err(|e| {
            TutorialError::provider(PROVIDER, format!("Failed to parse video response: {}", e))
        })?;

        let video = videos
            .items
            .into_iter()
            .next()
            .ok_or_else(|| TutorialError::NotFound("Video not found".to_string()))?;

        Ok(video.into())
    }
}

#[async_trait]
impl VideoProvider for YouTubeClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search_videos(
        &self,
        query: &str,
        options: &VideoSearchOptions,
    ) -> Result<Vec<NormalizedResult>, TutorialError> {
        let started = Instant::now();
        let result = self.fetch_search(query, options).await;
        observe_request(PROVIDER, "search", started, &result);
        result
    }

    async fn get_video_details(&self, video_id: &str) -> Result<NormalizedResult, TutorialError> {
        let started = Instant::now();
        let result = self.fetch_details(video_id).await;
        observe_request(PROVIDER, "details", started, &result);
        result
    }
}

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

impl Snippet {
    fn into_result(self, video_id: String) -> NormalizedResult {
        let mut result = NormalizedResult::new(
            video_id,
            ContentType::Video,
            self.title,
            SourceKind::Youtube.label(),
        );
        result.creator = self.channel_title;
        result.thumbnail = self.thumbnails.best();
        result.description = self.description;
        result.published_at = self.published_at;
        result
    }
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    standard: Option<Thumbnail>,
    maxres: Option<Thumbnail>,
}

impl Thumbnails {
    /// Highest resolution available.
    fn best(self) -> Option<String> {
        self.maxres
            .or(self.standard)
            .or(self.high)
            .or(self.medium)
            .or(self.default)
            .map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// Counters arrive as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(value: Option<String>) -> Option<u64> {
    value.and_then(|v| v.parse().ok())
}

impl From<VideoItem> for NormalizedResult {
    fn from(item: VideoItem) -> Self {
        let mut result = item.snippet.into_result(item.id);
        result.duration = item.content_details.and_then(|c| c.duration);
        if let Some(stats) = item.statistics {
            result.views = parse_count(stats.view_count);
            result.likes = parse_count(stats.like_count);
            result.comment_count = parse_count(stats.comment_count);
        }
        result
    }
}
