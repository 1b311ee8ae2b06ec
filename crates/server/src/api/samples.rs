//! Static sample dataset, served when live providers are not configured.

use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;
use tutorial_finder_core::{sample_tutorial, sample_tutorials, NormalizedResult};

use super::tutorials::DetailErrorResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleListResponse {
    pub results: Vec<NormalizedResult>,
    pub total_results: usize,
}

/// GET /api/sample/tutorials
pub async fn list_samples() -> Json<SampleListResponse> {
    let results = sample_tutorials();
    Json(SampleListResponse {
        total_results: results.len(),
        results,
    })
}

/// GET /api/sample/tutorials/{id}
pub async fn get_sample(
    Path(id): Path<String>,
) -> Result<Json<NormalizedResult>, impl IntoResponse> {
    sample_tutorial(&id).map(Json).ok_or_else(|| {
        warn!(path = %format!("/api/sample/tutorials/{}", id), "Sample tutorial not found");
        (
            StatusCode::NOT_FOUND,
            Json(DetailErrorResponse {
                error: "Tutorial not found".to_string(),
                message: None,
            }),
        )
    })
}
