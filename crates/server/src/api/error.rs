//! Error envelope shared by the generator route and its auth gate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// `{success: false, error, timestamp, path}` with optional details.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
    pub path: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: path.into(),
        }
    }

    /// A 400 for rejected input, with the reason in `details`.
    pub fn invalid_input(details: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new("Invalid input data", path)
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
