//! Tutorial domain model shared by every provider adapter.
//!
//! All adapters map their upstream payloads into [`NormalizedResult`] and
//! report failures through [`TutorialError`], so callers see one schema and
//! one error taxonomy regardless of where a tutorial came from.

mod types;

pub use types::*;

use thiserror::Error;

/// Errors produced by provider adapters, the aggregator and the detail resolver.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TutorialError {
    /// A provider credential is missing.
    #[error("{0}")]
    Configuration(String),

    /// Upstream transport or HTTP failure.
    #[error("{provider} request failed: {message}")]
    Provider { provider: String, message: String },

    /// The requested resource does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// A composite identifier did not match its expected pattern.
    #[error("Invalid guide ID format: {0}")]
    InvalidIdentifier(String),

    /// The source name is not backed by any adapter.
    #[error("Unsupported content source: {0}")]
    UnsupportedSource(String),

    /// The request itself is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TutorialError {
    /// Build a provider error for the named source.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable name of the error kind, used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Provider { .. } => "ProviderError",
            Self::NotFound(_) => "NotFoundError",
            Self::InvalidIdentifier(_) => "InvalidIdentifierError",
            Self::UnsupportedSource(_) => "UnsupportedSourceError",
            Self::InvalidRequest(_) => "InvalidRequestError",
        }
    }
}
