//! Mock video provider for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::providers::{VideoProvider, VideoSearchOptions};
use crate::tutorial::{NormalizedResult, TutorialError};

/// A recorded video search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedVideoSearch {
    pub query: String,
    pub options: VideoSearchOptions,
}

/// Mock implementation of the VideoProvider trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results and details
/// - Track searches for assertions
/// - Simulate missing credentials, failures, slow responses and panics
#[derive(Debug)]
pub struct MockVideoProvider {
    /// Results returned by every search.
    videos: Arc<RwLock<Vec<NormalizedResult>>>,
    /// Detail lookups by video id.
    details: Arc<RwLock<HashMap<String, NormalizedResult>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedVideoSearch>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TutorialError>>>,
    /// Panic inside the next search.
    panic_next: Arc<RwLock<bool>>,
    /// Behave as if no API key was configured.
    unconfigured: bool,
    /// Delay before answering.
    delay: Option<Duration>,
}

impl Default for MockVideoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoProvider {
    pub fn new() -> Self {
        Self {
            videos: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic_next: Arc::new(RwLock::new(false)),
            unconfigured: false,
            delay: None,
        }
    }

    /// A provider whose every call fails as if the API key were missing.
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::new()
        }
    }

    /// Answer every call after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn set_videos(&self, videos: Vec<NormalizedResult>) {
        *self.videos.write().await = videos;
    }

    pub async fn add_video_details(&self, video: NormalizedResult) {
        self.details.write().await.insert(video.id.clone(), video);
    }

    pub async fn recorded_searches(&self) -> Vec<RecordedVideoSearch> {
        self.searches.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TutorialError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the next search panic.
    pub async fn panic_on_search(&self) {
        *self.panic_next.write().await = true;
    }

    async fn check(&self) -> Result<(), TutorialError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unconfigured {
            return Err(TutorialError::Configuration(
                "YouTube API key is not configured".to_string(),
            ));
        }
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VideoProvider for MockVideoProvider {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn search_videos(
        &self,
        query: &str,
        options: &VideoSearchOptions,
    ) -> Result<Vec<NormalizedResult>, TutorialError> {
        self.searches.write().await.push(RecordedVideoSearch {
            query: query.to_string(),
            options: options.clone(),
        });

        let should_panic = std::mem::take(&mut *self.panic_next.write().await);
        if should_panic {
            panic!("mock video provider panicked");
        }

        self.check().await?;

        Ok(self
            .videos
            .read()
            .await
            .iter()
            .take(options.max_results as usize)
            .cloned()
            .collect())
    }

    async fn get_video_details(&self, video_id: &str) -> Result<NormalizedResult, TutorialError> {
        self.check().await?;
        self.details
            .read()
            .await
            .get(video_id)
            .cloned()
            .ok_or_else(|| TutorialError::NotFound("Video not found".to_string()))
    }
}
