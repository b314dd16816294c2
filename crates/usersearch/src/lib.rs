//! usersearch - GitHub user search with structured filters.
//!
//! This library turns structured filter selections into GitHub Search API
//! queries, executes them with a rate-limit aware client, and maps the
//! responses into paginated results.
//!
//! # Features
//!
//! - `reqwest` (default) - Real HTTP transport via [`http::reqwest_transport`].
//! - `test-util` - Exposes [`MockTransport`] for downstream test suites.
//!
//! # Example
//!
//! ```ignore
//! use usersearch::{CancelToken, ClientConfig, GitHubClient, SearchFilters, SearchService};
//!
//! let client = GitHubClient::new(ClientConfig::new(token))?;
//! let service = SearchService::new(client);
//!
//! let mut filters = SearchFilters::new("rust");
//! filters.location = Some("San Francisco".to_string());
//!
//! let outcome = service.search(&filters, &CancelToken::new()).await?;
//! println!("{} users", outcome.result.metadata.total_count);
//! ```

pub mod error;
pub mod filters;
pub mod github;
pub mod http;
pub mod ingress;
pub mod model;
pub mod query;
pub mod rate_limit;
pub mod retry;
pub mod search;
pub mod validation;

pub use error::SearchError;
pub use filters::{
    DateRangeFilter, RangeFilter, SearchFilters, SearchInField, SearchQuery, SortOption,
    SortOrder, UserType,
};
pub use github::{ClientConfig, GitHubClient, GitHubError};
pub use http::{HttpError, HttpHeaders, HttpRequest, HttpResponse, HttpTransport, header_get};
#[cfg(any(test, feature = "test-util"))]
pub use http::MockTransport;
pub use ingress::parse_search_request;
pub use model::{
    AccountType, RateLimitState, SearchMetadata, SearchOutcome, SearchResult, UserRecord,
};
pub use rate_limit::spawn_poller;
pub use retry::{CancelToken, RetryConfig};
pub use search::{PageRequest, SearchService, SearchSession, normalize};
pub use validation::{ValidationError, ValidationErrorKind, validate};
