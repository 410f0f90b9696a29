//! Census API error types

use std::time::Duration;
use thiserror::Error;

/// Message shown for any failure that is not a structured service error
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to connect to the census data service. Please try again later.";

/// Errors that can occur while asking the census service a question
#[derive(Debug, Error)]
pub enum ApiError {
    /// Structured error returned by the service (`{"detail": ...}`)
    #[error("API error {status}: {detail}")]
    Remote { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request task stopped without reporting an outcome
    #[error("Request task ended without a result")]
    Interrupted,
}

impl ApiError {
    /// Check if this is a structured error from the service
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Remote { .. })
    }

    /// Text to show the user
    ///
    /// Structured service errors are shown verbatim; everything else gets the
    /// fixed retry message so transport internals never reach the screen.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Remote { detail, .. } => detail.clone(),
            ApiError::Network(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Timeout(_)
            | ApiError::Json(_)
            | ApiError::Interrupted => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}
