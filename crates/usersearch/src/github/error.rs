//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::ApiErrorBody;
use crate::http::HttpError;

/// Terminal outcome of a failed API request.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Rate limit exceeded and max retries reached{}", fmt_reset(.reset_at))]
    RateLimitExceeded { reset_at: Option<DateTime<Utc>> },

    #[error("GitHub API authentication failed. Check your token.")]
    AuthenticationFailed,

    #[error("Resource not found")]
    NotFound,

    #[error("Validation failed: {message}")]
    Unprocessable { message: String },

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Fetch(String),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,
}

fn fmt_reset(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at
        .map(|at| format!(". Resets at {}", at.to_rfc3339()))
        .unwrap_or_default()
}

impl GitHubError {
    /// Classify a non-2xx response that is not a retryable rate limit.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = ApiErrorBody::parse(body)
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GitHub API error".to_string());
        match status {
            401 => Self::AuthenticationFailed,
            404 => Self::NotFound,
            422 => Self::Unprocessable { message },
            _ => Self::Api { status, message },
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::Unprocessable { .. } => "VALIDATION_ERROR",
            Self::Api { .. } => "GITHUB_API_ERROR",
            Self::Fetch(_) | Self::Decode(_) => "FETCH_ERROR",
            Self::Cancelled => "REQUEST_CANCELLED",
        }
    }

    /// HTTP-like status for surfacing the error.
    pub fn status(&self) -> u16 {
        match self {
            Self::RateLimitExceeded { .. } => 429,
            Self::AuthenticationFailed => 401,
            Self::NotFound => 404,
            Self::Unprocessable { .. } => 422,
            Self::Api { status, .. } => *status,
            Self::Fetch(_) | Self::Decode(_) => 500,
            Self::Cancelled => 499,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }
}

impl From<HttpError> for GitHubError {
    fn from(err: HttpError) -> Self {
        Self::Fetch(err.to_string())
    }
}
