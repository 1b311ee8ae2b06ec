//! Tutorial search handler.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tutorial_finder_core::{
    sample_tutorials, NormalizedResult, SearchOptions, TutorialError, VideoLength,
};

use super::error::ErrorEnvelope;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Query string of `GET /api/search`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    /// Used as the query when `q` is absent.
    pub category: Option<String>,
    pub video_length: Option<String>,
    /// Comma-separated source names.
    pub sources: Option<String>,
}

impl SearchParams {
    pub fn query(&self) -> &str {
        self.q
            .as_deref()
            .filter(|q| !q.is_empty())
            .or(self.category.as_deref())
            .unwrap_or("")
    }

    /// Translate into aggregator options; fails on an unknown `videoLength`.
    pub fn to_options(&self) -> Result<SearchOptions, TutorialError> {
        let sources = self.sources.as_deref().and_then(|raw| {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            (!names.is_empty()).then_some(names)
        });

        let options = SearchOptions {
            sources,
            ..Default::default()
        };

        match self.video_length.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => Ok(options.with_video_length(value.parse::<VideoLength>()?)),
            None => Ok(options),
        }
    }
}

/// 500 body: the static samples stand in for live results.
#[derive(Debug, Serialize)]
pub struct SearchUnavailableResponse {
    pub error: String,
    pub fallback: Vec<NormalizedResult>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/search
///
/// Fan the query out to the requested sources. Provider failures still
/// answer 200 with an `errors` list; such partial responses are marked
/// `no-store` so the response cache does not keep them.
pub async fn search_tutorials(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.query().to_string();
    info!("Search query received: {}", query);

    let result = match params.to_options() {
        Ok(options) => state.aggregator().search_tutorials(&query, &options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) if response.is_partial() => (
            [(header::CACHE_CONTROL, "no-store")],
            Json(response),
        )
            .into_response(),
        Ok(response) => Json(response).into_response(),
        Err(TutorialError::InvalidRequest(details)) => {
            warn!(path = %uri.path(), error = %details, "Rejected search request");
            ErrorEnvelope::invalid_input(details, uri.path()).with_status(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(path = %uri.path(), error = %e, "Search error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchUnavailableResponse {
                    error: "Search service unavailable".to_string(),
                    fallback: sample_tutorials(),
                }),
            )
                .into_response()
        }
    }
}
