//! Types for tutorial search requests and normalized results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TutorialError;

// ============================================================================
// Results
// ============================================================================

/// Kind of content a result points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Text,
    Game,
    Guide,
}

/// The common shape every provider adapter produces.
///
/// Identifiers are only unique within their source: `(source, id)` is the key.
/// Provider-specific fields are optional and each adapter owns its own set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Opaque id within the source namespace.
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Human-readable provider label ("YouTube", "Steam", ...).
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Provider-native duration encoding (ISO 8601 for YouTube).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u32>,
    /// Price in currency units (not cents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub developers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publishers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Free-form "last updated" text (static samples only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Owning game for guides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_title: Option<String>,
}

impl NormalizedResult {
    /// Create a result with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        content_type: ContentType,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content_type,
            title: title.into(),
            creator: None,
            source: source.into(),
            thumbnail: None,
            description: None,
            published_at: None,
            duration: None,
            views: None,
            likes: None,
            comment_count: None,
            rating: None,
            rating_count: None,
            price: None,
            currency: None,
            developers: vec![],
            publishers: vec![],
            genres: vec![],
            release_date: None,
            updated: None,
            game_id: None,
            game_title: None,
        }
    }

    /// Tag a guide with the game it belongs to.
    pub fn with_game(mut self, game_id: impl Into<String>, game_title: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self.game_title = Some(game_title.into());
        self
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Content sources the aggregator can dispatch to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Youtube,
    Steam,
}

impl SourceKind {
    /// Sources searched when the caller does not pick any.
    pub const DEFAULT: [SourceKind; 2] = [SourceKind::Youtube, SourceKind::Steam];

    /// Request-level name, as used in `sources=` and `?source=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "youtube",
            SourceKind::Steam => "steam",
        }
    }

    /// Provider label carried by results.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "YouTube",
            SourceKind::Steam => "Steam",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = TutorialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(SourceKind::Youtube),
            "steam" => Ok(SourceKind::Steam),
            _ => Err(TutorialError::UnsupportedSource(s.to_string())),
        }
    }
}

// ============================================================================
// Video length filter
// ============================================================================

/// Video length buckets shared between the browser client and the search API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoLength {
    Short,
    Medium,
    Long,
}

impl VideoLength {
    pub const ALL: [VideoLength; 3] = [VideoLength::Short, VideoLength::Medium, VideoLength::Long];

    pub fn value(&self) -> &'static str {
        match self {
            VideoLength::Short => "short",
            VideoLength::Medium => "medium",
            VideoLength::Long => "long",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoLength::Short => "Short (< 5 min)",
            VideoLength::Medium => "Medium (5-15 min)",
            VideoLength::Long => "Long (> 15 min)",
        }
    }

    /// Lower bound in seconds.
    pub fn min_secs(&self) -> u32 {
        match self {
            VideoLength::Short => 0,
            VideoLength::Medium => 300,
            VideoLength::Long => 900,
        }
    }

    /// Upper bound in seconds.
    pub fn max_secs(&self) -> u32 {
        match self {
            VideoLength::Short => 300,
            VideoLength::Medium => 900,
            VideoLength::Long => 3600,
        }
    }
}

impl FromStr for VideoLength {
    type Err = TutorialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoLength::ALL
            .into_iter()
            .find(|v| v.value().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TutorialError::InvalidRequest(format!("Unknown video length: {}", s)))
    }
}

// ============================================================================
// Requests and responses
// ============================================================================

/// Options for an aggregated tutorial search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Source names to query; `None` means [`SourceKind::DEFAULT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Minimum video length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration_min: Option<u32>,
    /// Maximum video length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration_max: Option<u32>,
}

impl SearchOptions {
    /// Apply the bounds of a video length bucket.
    pub fn with_video_length(mut self, length: VideoLength) -> Self {
        self.video_duration_min = Some(length.min_secs());
        self.video_duration_max = Some(length.max_secs());
        self
    }
}

/// A failure recorded for one source during an aggregated search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

/// Merged output of one aggregated search.
///
/// `results` order carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResponse {
    pub results: Vec<NormalizedResult>,
    /// `None` unless at least one requested source failed.
    pub errors: Option<Vec<SourceError>>,
    pub sources: Vec<String>,
    pub query: String,
    pub total_results: usize,
}

impl AggregatedResponse {
    pub fn new(
        query: impl Into<String>,
        sources: Vec<String>,
        results: Vec<NormalizedResult>,
        errors: Vec<SourceError>,
    ) -> Self {
        let total_results = results.len();
        Self {
            results,
            errors: if errors.is_empty() { None } else { Some(errors) },
            sources,
            query: query.into(),
            total_results,
        }
    }

    /// Whether any requested source failed.
    pub fn is_partial(&self) -> bool {
        self.errors.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_result_serializes_type_and_camel_case() {
        let mut video = NormalizedResult::new("abc", ContentType::Video, "Malenia", "YouTube");
        video.published_at = Some("2024-01-01T00:00:00Z".to_string());
        video.comment_count = Some(3);

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["publishedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["commentCount"], 3);
        assert!(json.get("price").is_none());
        assert!(json.get("genres").is_none());
    }

    #[test]
    fn test_with_game_tags_guide() {
        let guide = NormalizedResult::new("guide_570_1", ContentType::Guide, "Basics", "Steam Community")
            .with_game("570", "Dota 2");
        let json = serde_json::to_value(&guide).unwrap();
        assert_eq!(json["gameId"], "570");
        assert_eq!(json["gameTitle"], "Dota 2");
    }

    #[test]
    fn test_source_kind_parse_is_case_insensitive() {
        assert_eq!("YouTube".parse::<SourceKind>().unwrap(), SourceKind::Youtube);
        assert_eq!(" steam ".parse::<SourceKind>().unwrap(), SourceKind::Steam);
        assert!(matches!(
            "vimeo".parse::<SourceKind>(),
            Err(TutorialError::UnsupportedSource(s)) if s == "vimeo"
        ));
    }

    #[test]
    fn test_video_length_table() {
        let short: VideoLength = "short".parse().unwrap();
        assert_eq!((short.min_secs(), short.max_secs()), (0, 300));
        let medium: VideoLength = "MEDIUM".parse().unwrap();
        assert_eq!((medium.min_secs(), medium.max_secs()), (300, 900));
        let long: VideoLength = "long".parse().unwrap();
        assert_eq!((long.min_secs(), long.max_secs()), (900, 3600));
        assert!("epic".parse::<VideoLength>().is_err());
    }

    #[test]
    fn test_aggregated_response_errors_null_when_empty() {
        let response = AggregatedResponse::new("q", vec!["youtube".to_string()], vec![], vec![]);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["errors"].is_null());
        assert_eq!(json["totalResults"], 0);
        assert!(!response.is_partial());
    }

    #[test]
    fn test_aggregated_response_total_matches_results() {
        let results = vec![
            NormalizedResult::new("1", ContentType::Video, "a", "YouTube"),
            NormalizedResult::new("2", ContentType::Guide, "b", "Steam Community"),
        ];
        let errors = vec![SourceError {
            source: "steam".to_string(),
            message: "boom".to_string(),
        }];
        let response = AggregatedResponse::new("q", vec![], results, errors);
        assert_eq!(response.total_results, response.results.len());
        assert!(response.is_partial());
    }
}
