//! Rate-limit aware GitHub REST client.

use std::sync::Arc;
#[cfg(feature = "reqwest")]
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::form_urlencoded;

use super::convert::{to_rate_limit, to_search_result};
use super::error::GitHubError;
use super::types::{RateLimitResponse, SearchResponse};
use crate::filters::SearchQuery;
use crate::http::{HttpHeaders, HttpRequest, HttpTransport, header_get};
use crate::model::{HEADER_REMAINING, HEADER_RESET, RateLimitState, SearchOutcome};
use crate::retry::{CancelToken, RetryConfig, reset_wait};
use crate::validation::DEFAULT_PER_PAGE;

#[cfg(feature = "reqwest")]
use crate::http::reqwest_transport::ReqwestTransport;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "usersearch";

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub token: String,
    pub api_url: String,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// A decoded body plus the raw response headers.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub headers: HttpHeaders,
}

impl<T> ApiResponse<T> {
    pub fn rate_limit(&self) -> Option<RateLimitState> {
        RateLimitState::from_headers(&self.headers)
    }
}

/// GitHub API client.
///
/// Holds no mutable state: each call runs its own retry loop and returns
/// whatever rate-limit information the response carried.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
}

impl GitHubClient {
    /// Create a client backed by reqwest with a 30 second request timeout.
    #[cfg(feature = "reqwest")]
    pub fn new(config: ClientConfig) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))?;
        Ok(Self::new_with_transport(config, Arc::new(transport)))
    }

    pub fn new_with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = ClientConfig {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            ..config
        };
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn headers(&self) -> HttpHeaders {
        vec![
            ("Accept".to_string(), ACCEPT.to_string()),
            (
                "Authorization".to_string(),
                format!("token {}", self.config.token),
            ),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
        ]
    }

    /// `GET /search/users` URL with form-encoded parameters.
    pub fn search_url(&self, query: &SearchQuery) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        for (key, value) in query.to_query_pairs() {
            params.append_pair(key, &value);
        }
        format!("{}/search/users?{}", self.config.api_url, params.finish())
    }

    pub fn rate_limit_url(&self) -> String {
        format!("{}/rate_limit", self.config.api_url)
    }

    /// GET `url` and decode the JSON body, retrying rate-limit exhaustion and
    /// transient transport failures.
    ///
    /// Exhaustion is a `403` with `X-RateLimit-Remaining: 0`. At most
    /// `max_retries + 1` attempts are made; every other failure is terminal on
    /// first sight. The token is checked before each attempt, and both the
    /// transport call and the backoff sleep end early when it fires.
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancelToken,
    ) -> Result<ApiResponse<T>, GitHubError> {
        let retry = &self.config.retry;
        let mut schedule = retry.schedule();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(GitHubError::Cancelled);
            }

            debug!(url, attempt, "GitHub API request");
            let request = HttpRequest {
                url: url.to_string(),
                headers: self.headers(),
            };
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(GitHubError::Cancelled),
                outcome = self.transport.get(request) => outcome,
            };

            let delay = match outcome {
                Ok(response) if is_rate_limit_exhausted(response.status, &response.headers) => {
                    let reset = header_get(&response.headers, HEADER_RESET)
                        .and_then(|v| v.trim().parse::<i64>().ok());

                    if attempt >= retry.max_retries {
                        return Err(GitHubError::RateLimitExceeded {
                            reset_at: reset.and_then(|r| DateTime::from_timestamp(r, 0)),
                        });
                    }

                    let hint = reset.and_then(|r| reset_wait(r, Utc::now().timestamp_millis()));
                    let scheduled = schedule.next().unwrap_or(retry.max_delay);
                    let delay = retry.next_delay(scheduled, hint);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit exceeded, retrying"
                    );
                    delay
                }
                Ok(response) if !response.is_success() => {
                    return Err(GitHubError::from_status(response.status, &response.body));
                }
                Ok(response) => {
                    let data = serde_json::from_slice(&response.body)?;
                    return Ok(ApiResponse {
                        data,
                        headers: response.headers,
                    });
                }
                Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                    let scheduled = schedule.next().unwrap_or(retry.max_delay);
                    let delay = retry.next_delay(scheduled, None);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    delay
                }
                Err(err) => return Err(err.into()),
            };

            tokio::select! {
                _ = cancel.cancelled() => return Err(GitHubError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Run a search and map the page. Missing paging parameters default to
    /// page 1 and the default page size when deriving metadata.
    pub async fn search_users(
        &self,
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, GitHubError> {
        let url = self.search_url(query);
        let response: ApiResponse<SearchResponse> = self.request(&url, cancel).await?;
        let rate_limit = response.rate_limit();

        let result = to_search_result(
            response.data,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        );
        Ok(SearchOutcome { result, rate_limit })
    }

    /// Current state of the search rate-limit bucket.
    pub async fn get_rate_limit(&self, cancel: &CancelToken) -> Result<RateLimitState, GitHubError> {
        let url = self.rate_limit_url();
        let response: ApiResponse<RateLimitResponse> = self.request(&url, cancel).await?;
        Ok(to_rate_limit(&response.data))
    }
}

fn is_rate_limit_exhausted(status: u16, headers: &HttpHeaders) -> bool {
    status == 403 && header_get(headers, HEADER_REMAINING).map(str::trim) == Some("0")
}
