use thiserror::Error;

use crate::github::GitHubError;
use crate::validation::ValidationError;

/// Any failure of a search operation, from body parsing to the remote call.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

impl SearchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::GitHub(e) => e.code(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(e) => e.status(),
            Self::InvalidJson(_) => 400,
            Self::GitHub(e) => e.status(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
