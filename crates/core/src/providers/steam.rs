//! Steam client covering the store API and community guides.
//!
//! Games come from the storefront endpoints (`storesearch`, `appdetails`),
//! guides from the Web API `IPublishedFileService/QueryFiles`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::guide_id::encode_guide_id;
use super::{check_status, observe_request, transport_error, GameProvider};
use crate::tutorial::{ContentType, NormalizedResult, SourceKind, TutorialError};

const PROVIDER: &str = "steam";
const DEFAULT_STORE_BASE_URL: &str = "https://store.steampowered.com/api";
const DEFAULT_WEB_API_BASE_URL: &str = "https://api.steampowered.com";
const GUIDE_SOURCE_LABEL: &str = "Steam Community";
const DEFAULT_CURRENCY: &str = "USD";

/// Steam client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteamConfig {
    /// Web API key. Falls back to `STEAM_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Storefront API base (default: https://store.steampowered.com/api).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_base_url: Option<String>,
    /// Web API base (default: https://api.steampowered.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_api_base_url: Option<String>,
    /// Games matched per search before fetching guides.
    #[serde(default = "default_game_count")]
    pub game_count: u32,
    /// Guides fetched per game.
    #[serde(default = "default_guides_per_game")]
    pub guides_per_game: u32,
    /// `filetype` filter for QueryFiles (10 = all guides).
    #[serde(default = "default_guide_file_type")]
    pub guide_file_type: u32,
}

fn default_game_count() -> u32 {
    3
}

fn default_guides_per_game() -> u32 {
    5
}

fn default_guide_file_type() -> u32 {
    10
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            store_base_url: None,
            web_api_base_url: None,
            game_count: default_game_count(),
            guides_per_game: default_guides_per_game(),
            guide_file_type: default_guide_file_type(),
        }
    }
}

/// Steam store and community client.
pub struct SteamClient {
    client: Client,
    store_base_url: String,
    web_api_base_url: String,
    api_key: Option<String>,
    guides_per_game: u32,
    guide_file_type: u32,
}

impl SteamClient {
    /// Create a new client. A missing key only fails at call time.
    pub fn new(config: SteamConfig, timeout: Duration) -> Result<Self, TutorialError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            TutorialError::Configuration(format!("Failed to build Steam HTTP client: {}", e))
        })?;

        let store_base_url = config
            .store_base_url
            .unwrap_or_else(|| DEFAULT_STORE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let web_api_base_url = config
            .web_api_base_url
            .unwrap_or_else(|| DEFAULT_WEB_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            store_base_url,
            web_api_base_url,
            api_key: config.api_key.filter(|k| !k.is_empty()),
            guides_per_game: config.guides_per_game,
            guide_file_type: config.guide_file_type,
        })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, TutorialError> {
        self.api_key.as_deref().ok_or_else(|| {
            TutorialError::Configuration("Steam API key is not configured".to_string())
        })
    }

    async fn fetch_games(&self, query: &str, count: u32) -> Result<Vec<NormalizedResult>, TutorialError> {
        self.api_key()?;
        let url = format!("{}/storesearch/", self.store_base_url);

        debug!("Steam store search: term='{}', count={}", query, count);

        let response = self
            .client
            .get(&url)
            .query(&[("term", query), ("l", "english"), ("cc", "US")])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;

        let search: StoreSearchResponse = response.json().await.map_err(|e| {
            TutorialError::provider(PROVIDER, format!("Failed to parse store search response: {}", e))
        })?;

        Ok(search
            .items
            .into_iter()
            .take(count as usize)
            .map(NormalizedResult::from)
            .collect())
    }

    async fn fetch_game_details(&self, app_id: &str) -> Result<NormalizedResult, TutorialError> {
        let api_key = self.api_key()?;
        let url = format!("{}/appdetails/", self.store_base_url);

        debug!("Steam app details: appid={}", app_id);

        let response = self
            .client
            .get(&url)
            .query(&[("appids", app_id), ("key", api_key)])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;

        let mut details: HashMap<String, AppDetailsEntry> = response.json().await.map_err(|e| {
            TutorialError::provider(PROVIDER, format!("Failed to parse app details response: {}", e))
        })?;

        let data = details
            .remove(app_id)
            .filter(|entry| entry.success)
            .and_then(|entry| entry.data)
            .ok_or_else(|| TutorialError::NotFound("Game not found".to_string()))?;

        Ok(data.into_result(app_id))
    }

    async fn fetch_guides(&self, app_id: &str) -> Result<Vec<NormalizedResult>, TutorialError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/IPublishedFileService/QueryFiles/v1/",
            self.web_api_base_url
        );
        let per_page = self.guides_per_game.to_string();
        let file_type = self.guide_file_type.to_string();

        debug!("Steam guides: appid={}, per_page={}", app_id, per_page);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", api_key),
                ("appid", app_id),
                ("query_type", "0"),
                ("page", "1"),
                ("numperpage", per_page.as_str()),
                ("filetype", file_type.as_str()),
                ("return_vote_data", "true"),
                ("return_short_description", "true"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;

        let files: QueryFilesResponse = response.json().await.map_err(|e| {
            TutorialError::provider(PROVIDER, format!("Failed to parse guide response: {}", e))
        })?;

        // Sequence numbers follow the provider's order, untitled entries included,
        // so an id keeps resolving to the same guide on refetch.
        Ok(files
            .response
            .publishedfiledetails
            .into_iter()
            .enumerate()
            .filter_map(|(index, file)| {
                let guide = file.into_guide(app_id, index + 1);
                if guide.is_none() {
                    debug!(
                        "Steam guides: skipping untitled entry {} for appid={}",
                        index + 1,
                        app_id
                    );
                }
                guide
            })
            .collect())
    }
}

#[async_trait]
impl GameProvider for SteamClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search_games(
        &self,
        query: &str,
        count: u32,
    ) -> Result<Vec<NormalizedResult>, TutorialError> {
        let started = Instant::now();
        let result = self.fetch_games(query, count).await;
        observe_request(PROVIDER, "search_games", started, &result);
        result
    }

    async fn get_game_details(&self, app_id: &str) -> Result<NormalizedResult, TutorialError> {
        let started = Instant::now();
        let result = self.fetch_game_details(app_id).await;
        observe_request(PROVIDER, "game_details", started, &result);
        result
    }

    async fn get_game_guides(&self, app_id: &str) -> Result<Vec<NormalizedResult>, TutorialError> {
        let started = Instant::now();
        let result = self.fetch_guides(app_id).await;
        observe_request(PROVIDER, "guides", started, &result);
        result
    }
}

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StoreSearchResponse {
    #[serde(default)]
    items: Vec<StoreSearchItem>,
}

#[derive(Debug, Deserialize)]
struct StoreSearchItem {
    id: u64,
    name: String,
    tiny_image: Option<String>,
    price: Option<SteamPrice>,
}

/// Prices are in cents.
#[derive(Debug, Deserialize)]
struct SteamPrice {
    currency: String,
    #[serde(rename = "final")]
    final_cents: i64,
}

fn apply_price(result: &mut NormalizedResult, price: Option<SteamPrice>) {
    match price {
        Some(p) => {
            result.price = Some(p.final_cents as f64 / 100.0);
            result.currency = Some(p.currency);
        }
        None => {
            result.price = Some(0.0);
            result.currency = Some(DEFAULT_CURRENCY.to_string());
        }
    }
}

impl From<StoreSearchItem> for NormalizedResult {
    fn from(item: StoreSearchItem) -> Self {
        let mut result = NormalizedResult::new(
            item.id.to_string(),
            ContentType::Game,
            item.name,
            SourceKind::Steam.label(),
        );
        result.thumbnail = item.tiny_image;
        apply_price(&mut result, item.price);
        result
    }
}

#[derive(Debug, Deserialize)]
struct AppDetailsEntry {
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    name: String,
    short_description: Option<String>,
    header_image: Option<String>,
    price_overview: Option<SteamPrice>,
    #[serde(default)]
    developers: Vec<String>,
    #[serde(default)]
    publishers: Vec<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    release_date: Option<ReleaseDate>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseDate {
    date: Option<String>,
}

impl AppData {
    fn into_result(self, app_id: &str) -> NormalizedResult {
        let mut result = NormalizedResult::new(
            app_id,
            ContentType::Game,
            self.name,
            SourceKind::Steam.label(),
        );
        result.description = self.short_description;
        result.thumbnail = self.header_image;
        apply_price(&mut result, self.price_overview);
        result.developers = self.developers;
        result.publishers = self.publishers;
        result.genres = self.genres.into_iter().map(|g| g.description).collect();
        result.release_date = self.release_date.and_then(|r| r.date);
        result
    }
}

#[derive(Debug, Deserialize)]
struct QueryFilesResponse {
    #[serde(default)]
    response: QueryFilesBody,
}

#[derive(Debug, Default, Deserialize)]
struct QueryFilesBody {
    #[serde(default)]
    publishedfiledetails: Vec<PublishedFile>,
}

#[derive(Debug, Deserialize)]
struct PublishedFile {
    /// Missing for hidden or removed files.
    #[serde(default)]
    title: Option<String>,
    creator: Option<String>,
    short_description: Option<String>,
    file_description: Option<String>,
    preview_url: Option<String>,
    time_created: Option<i64>,
    views: Option<u64>,
    vote_data: Option<VoteData>,
}

#[derive(Debug, Deserialize)]
struct VoteData {
    score: f32,
    #[serde(default)]
    votes_up: u32,
    #[serde(default)]
    votes_down: u32,
}

impl PublishedFile {
    fn into_guide(self, app_id: &str, sequence: usize) -> Option<NormalizedResult> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let mut guide = NormalizedResult::new(
            encode_guide_id(app_id, sequence),
            ContentType::Guide,
            title,
            GUIDE_SOURCE_LABEL,
        );
        guide.creator = self.creator;
        guide.description = self.short_description.or(self.file_description);
        guide.thumbnail = self.preview_url.filter(|u| !u.is_empty());
        guide.published_at = self
            .time_created
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .map(|d| d.to_rfc3339());
        guide.views = self.views;
        if let Some(votes) = self.vote_data {
            // score is 0..1, ratings are out of 5
            guide.rating = Some((votes.score * 5.0 * 10.0).round() / 10.0);
            guide.rating_count = Some(votes.votes_up + votes.votes_down);
        }
        guide.game_id = Some(app_id.to_string());
        Some(guide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_item_price_converted_from_cents() {
        let json = r#"{"items": [
            {"type": "app", "id": 1245620, "name": "ELDEN RING",
             "tiny_image": "https://cdn/capsule.jpg",
             "price": {"currency": "USD", "initial": 5999, "final": 5999}},
            {"type": "app", "id": 570, "name": "Dota 2"}
        ]}"#;

        let search: StoreSearchResponse = serde_json::from_str(json).unwrap();
        let games: Vec<NormalizedResult> = search.items.into_iter().map(Into::into).collect();

        assert_eq!(games[0].id, "1245620");
        assert_eq!(games[0].content_type, ContentType::Game);
        assert_eq!(games[0].source, "Steam");
        assert_eq!(games[0].price, Some(59.99));
        assert_eq!(games[0].currency.as_deref(), Some("USD"));
        assert_eq!(games[1].price, Some(0.0));
        assert_eq!(games[1].currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_app_details_flattens_genres() {
        let json = r#"{"570": {"success": true, "data": {
            "name": "Dota 2",
            "short_description": "MOBA",
            "header_image": "https://cdn/header.jpg",
            "developers": ["Valve"],
            "publishers": ["Valve"],
            "genres": [{"id": "1", "description": "Action"}, {"id": "37", "description": "Free to Play"}],
            "release_date": {"coming_soon": false, "date": "9 Jul, 2013"}
        }}}"#;

        let mut details: HashMap<String, AppDetailsEntry> = serde_json::from_str(json).unwrap();
        let game = details.remove("570").unwrap().data.unwrap().into_result("570");

        assert_eq!(game.title, "Dota 2");
        assert_eq!(game.genres, vec!["Action", "Free to Play"]);
        assert_eq!(game.developers, vec!["Valve"]);
        assert_eq!(game.release_date.as_deref(), Some("9 Jul, 2013"));
        assert_eq!(game.price, Some(0.0));
    }

    #[test]
    fn test_published_file_becomes_guide() {
        let json = r#"{"response": {"total": 1, "publishedfiledetails": [{
            "publishedfileid": "123",
            "creator": "76561198000000000",
            "title": "Beginner's Guide",
            "short_description": "Start here",
            "preview_url": "https://cdn/preview.jpg",
            "time_created": 1700000000,
            "views": 4200,
            "vote_data": {"score": 0.9, "votes_up": 90, "votes_down": 10}
        }]}}"#;

        let files: QueryFilesResponse = serde_json::from_str(json).unwrap();
        let guide = files
            .response
            .publishedfiledetails
            .into_iter()
            .next()
            .unwrap()
            .into_guide("570", 1)
            .unwrap();

        assert_eq!(guide.id, "guide_570_1");
        assert_eq!(guide.content_type, ContentType::Guide);
        assert_eq!(guide.source, "Steam Community");
        assert_eq!(guide.game_id.as_deref(), Some("570"));
        assert_eq!(guide.rating, Some(4.5));
        assert_eq!(guide.rating_count, Some(100));
        assert_eq!(guide.published_at.as_deref(), Some("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn test_untitled_file_is_skipped() {
        let json = r#"{"response": {"publishedfiledetails": [
            {"publishedfileid": "1", "result": 9}
        ]}}"#;

        let files: QueryFilesResponse = serde_json::from_str(json).unwrap();
        let file = files.response.publishedfiledetails.into_iter().next().unwrap();
        assert!(file.into_guide("570", 1).is_none());
    }

    #[test]
    fn test_empty_query_files_response() {
        let files: QueryFilesResponse = serde_json::from_str(r#"{"response": {"total": 0}}"#).unwrap();
        assert!(files.response.publishedfiledetails.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = SteamClient::new(SteamConfig::default(), Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());

        let err = client.search_games("elden ring", 3).await.unwrap_err();
        assert_eq!(
            err,
            TutorialError::Configuration("Steam API key is not configured".to_string())
        );
        assert!(matches!(
            client.get_game_guides("570").await,
            Err(TutorialError::Configuration(_))
        ));
        assert!(matches!(
            client.get_game_details("570").await,
            Err(TutorialError::Configuration(_))
        ));
    }
}
