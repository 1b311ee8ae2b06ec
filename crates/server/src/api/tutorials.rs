//! Tutorial detail and generation handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use tutorial_finder_core::{
    GeneratedTutorial, GenerationOptions, GeneratorError, TutorialError,
};

use super::error::ErrorEnvelope;
use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    pub source: Option<String>,
}

/// Request body for tutorial generation
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Option<GenerationOptions>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub data: GeneratedTutorial,
}

#[derive(Debug, Serialize)]
pub struct DetailErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DetailErrorResponse {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tutorials/{id}?source=
pub async fn get_tutorial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DetailParams>,
) -> Result<Json<tutorial_finder_core::NormalizedResult>, impl IntoResponse> {
    let path = uri.path();
    let source = match params.source.as_deref().map(str::trim) {
        Some(source) if !source.is_empty() => source.to_string(),
        _ => {
            warn!(path = %path, "Tutorial lookup without source parameter");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(DetailErrorResponse::new("Source parameter is required")),
            ))
        }
    };

    info!("Fetching tutorial details for ID: {} from source: {}", id, source);

    match state.aggregator().get_tutorial_details(&id, &source).await {
        Ok(tutorial) => Ok(Json(tutorial)),
        Err(TutorialError::NotFound(reason)) => {
            warn!(path = %path, source = %source, error = %reason, "Tutorial not found");
            Err((
                StatusCode::NOT_FOUND,
                Json(DetailErrorResponse::new("Tutorial not found")),
            ))
        }
        Err(e) => {
            error!(path = %path, error = %e, "Error fetching tutorial details");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DetailErrorResponse {
                    error: "An error occurred while fetching tutorial details".to_string(),
                    message: Some(e.to_string()),
                }),
            ))
        }
    }
}

/// POST /api/tutorials/generate
///
/// Requires an authenticated caller when auth is enabled.
pub async fn generate_tutorial(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    let path = uri.path();
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(path = %path, error = %rejection.body_text(), "Rejected generation request");
            return ErrorEnvelope::invalid_input(rejection.body_text(), path)
                .with_status(StatusCode::BAD_REQUEST)
        }
    };

    debug!(user = %user_id, "Generating tutorial");

    let options = body.options.unwrap_or_default();
    match state.generator().generate(&body.prompt, &options).await {
        Ok(data) => Json(GenerateResponse {
            success: true,
            data,
        })
        .into_response(),
        Err(GeneratorError::EmptyPrompt) => {
            warn!(path = %path, user = %user_id, "Rejected generation request: empty prompt");
            ErrorEnvelope::invalid_input(GeneratorError::EmptyPrompt.to_string(), path)
                .with_status(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(path = %path, user = %user_id, error = %e, "Tutorial generation failed");
            ErrorEnvelope::new(e.to_string(), path).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
