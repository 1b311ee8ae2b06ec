//! Mock game provider for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::providers::GameProvider;
use crate::tutorial::{NormalizedResult, TutorialError};

/// A recorded game search for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGameSearch {
    pub query: String,
    pub count: u32,
}

/// Mock implementation of the GameProvider trait.
///
/// Every search returns the configured games (up to `count`), in insertion
/// order. Guides are configured per app id; a guide fetch can be made to
/// fail for a single app.
#[derive(Debug)]
pub struct MockGameProvider {
    games: Arc<RwLock<Vec<NormalizedResult>>>,
    guides: Arc<RwLock<HashMap<String, Vec<NormalizedResult>>>>,
    guide_failures: Arc<RwLock<HashMap<String, TutorialError>>>,
    game_searches: Arc<RwLock<Vec<RecordedGameSearch>>>,
    guide_requests: Arc<RwLock<Vec<String>>>,
    /// If set, the next search or detail lookup will fail with this error.
    next_error: Arc<RwLock<Option<TutorialError>>>,
    unconfigured: bool,
}

impl Default for MockGameProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGameProvider {
    pub fn new() -> Self {
        Self {
            games: Arc::new(RwLock::new(Vec::new())),
            guides: Arc::new(RwLock::new(HashMap::new())),
            guide_failures: Arc::new(RwLock::new(HashMap::new())),
            game_searches: Arc::new(RwLock::new(Vec::new())),
            guide_requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            unconfigured: false,
        }
    }

    /// A provider whose every call fails as if the API key were missing.
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::new()
        }
    }

    pub async fn add_game(&self, game: NormalizedResult) {
        self.games.write().await.push(game);
    }

    pub async fn set_guides(&self, app_id: &str, guides: Vec<NormalizedResult>) {
        self.guides.write().await.insert(app_id.to_string(), guides);
    }

    /// Make every guide fetch for `app_id` fail.
    pub async fn fail_guides_for(&self, app_id: &str, error: TutorialError) {
        self.guide_failures
            .write()
            .await
            .insert(app_id.to_string(), error);
    }

    /// Configure the next search or detail lookup to fail.
    pub async fn set_next_error(&self, error: TutorialError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_game_searches(&self) -> Vec<RecordedGameSearch> {
        self.game_searches.read().await.clone()
    }

    /// App ids guides were requested for, in call order.
    pub async fn recorded_guide_requests(&self) -> Vec<String> {
        self.guide_requests.read().await.clone()
    }

    async fn check(&self) -> Result<(), TutorialError> {
        if self.unconfigured {
            return Err(TutorialError::Configuration(
                "Steam API key is not configured".to_string(),
            ));
        }
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GameProvider for MockGameProvider {
    fn name(&self) -> &str {
        "steam"
    }

    async fn search_games(
        &self,
        query: &str,
        count: u32,
    ) -> Result<Vec<NormalizedResult>, TutorialError> {
        self.game_searches.write().await.push(RecordedGameSearch {
            query: query.to_string(),
            count,
        });
        self.check().await?;

        Ok(self
            .games
            .read()
            .await
            .iter()
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn get_game_details(&self, app_id: &str) -> Result<NormalizedResult, TutorialError> {
        self.check().await?;
        self.games
            .read()
            .await
            .iter()
            .find(|g| g.id == app_id)
            .cloned()
            .ok_or_else(|| TutorialError::NotFound("Game not found".to_string()))
    }

    async fn get_game_guides(&self, app_id: &str) -> Result<Vec<NormalizedResult>, TutorialError> {
        self.guide_requests.write().await.push(app_id.to_string());
        if self.unconfigured {
            return Err(TutorialError::Configuration(
                "Steam API key is not configured".to_string(),
            ));
        }
        if let Some(err) = self.guide_failures.read().await.get(app_id) {
            return Err(err.clone());
        }
        Ok(self
            .guides
            .read()
            .await
            .get(app_id)
            .cloned()
            .unwrap_or_default())
    }
}
