//! GitHub REST API access for user search.
//!
//! # Module Structure
//!
//! - [`client`] - HTTP client with retry, backoff and cancellation
//! - [`types`] - Wire types as returned by the API
//! - [`convert`] - Wire types to [`crate::model`] conversion
//! - [`error`] - Terminal error classification

pub mod client;
pub mod convert;
mod error;
pub mod types;

pub use client::{ApiResponse, ClientConfig, DEFAULT_API_URL, DEFAULT_USER_AGENT, GitHubClient};
pub use convert::{to_rate_limit, to_search_result, to_user_record};
pub use error::GitHubError;
