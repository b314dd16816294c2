//! GitHub API wire types.

use serde::{Deserialize, Serialize};

use crate::model::AccountType;

/// A user item from `GET /search/users`.
///
/// Search results only carry the identity fields; profile counters are
/// present when the engine chooses to include them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub public_repos: Option<u64>,
    #[serde(default)]
    pub public_gists: Option<u64>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub following: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    pub incomplete_results: bool,
    pub items: Vec<ApiUser>,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Requests used in current period.
    #[serde(default)]
    pub used: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// Unix timestamp when the rate limit resets.
    pub reset: i64,
}

/// Rate limit buckets from `GET /rate_limit`. Only the ones this crate reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResources {
    /// Core API rate limit (non-search REST endpoints).
    #[serde(default)]
    pub core: Option<RateLimitResource>,
    /// Search API rate limit.
    pub search: RateLimitResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort parse; a body that is not JSON yields an empty message.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_accepts_minimal_items() {
        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "id": 1,
                "login": "octocat",
                "avatar_url": "https://avatars.githubusercontent.com/u/1",
                "html_url": "https://github.com/octocat",
                "type": "User",
                "score": 1.0,
                "site_admin": false
            }]
        }))
        .expect("search response");

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].login, "octocat");
        assert_eq!(response.items[0].followers, None);
    }

    #[test]
    fn rate_limit_response_reads_search_bucket() {
        let response: RateLimitResponse = serde_json::from_value(serde_json::json!({
            "resources": {
                "core": { "limit": 5000, "used": 1, "remaining": 4999, "reset": 1700000000 },
                "search": { "limit": 30, "used": 2, "remaining": 28, "reset": 1700000060 },
                "graphql": { "limit": 5000, "used": 0, "remaining": 5000, "reset": 1700000000 }
            },
            "rate": { "limit": 5000, "used": 1, "remaining": 4999, "reset": 1700000000 }
        }))
        .expect("rate limit response");

        assert_eq!(response.resources.search.remaining, 28);
        assert_eq!(response.resources.core.map(|c| c.limit), Some(5000));
    }

    #[test]
    fn error_body_parse_is_lenient() {
        let body = ApiErrorBody::parse(br#"{"message":"Bad credentials","documentation_url":"https://docs.github.com"}"#);
        assert_eq!(body.message.as_deref(), Some("Bad credentials"));

        let body = ApiErrorBody::parse(b"<html>oops</html>");
        assert_eq!(body.message, None);
    }
}
