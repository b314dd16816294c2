//! Internal result types handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::{HttpHeaders, header_get};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    User,
    Organization,
    /// Anything else the engine reports (e.g. `Bot`).
    #[serde(other)]
    Other,
}

/// A user as returned by a search.
///
/// The search endpoint omits profile details such as `name` or `followers`;
/// those fields are `None` unless the engine includes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub public_repos: Option<u64>,
    pub public_gists: Option<u64>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    /// Reported total, capped at the engine's result ceiling.
    pub total_count: u64,
    pub incomplete_results: bool,
    pub current_page: u32,
    pub per_page: u32,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub users: Vec<UserRecord>,
    pub metadata: SearchMetadata,
}

/// A mapped search page together with the rate-limit headers that came with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub rate_limit: Option<RateLimitState>,
}

pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RESET: &str = "X-RateLimit-Reset";
pub const HEADER_USED: &str = "X-RateLimit-Used";

/// Snapshot of the search rate-limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp (seconds) when the window resets.
    pub reset: i64,
    pub used: u64,
}

impl RateLimitState {
    /// Parse the `X-RateLimit-*` response headers.
    ///
    /// Limit, remaining and reset are required; a missing `used` counts as 0.
    pub fn from_headers(headers: &HttpHeaders) -> Option<Self> {
        let limit = header_get(headers, HEADER_LIMIT)?.trim().parse().ok()?;
        let remaining = header_get(headers, HEADER_REMAINING)?.trim().parse().ok()?;
        let reset = header_get(headers, HEADER_RESET)?.trim().parse().ok()?;
        let used = header_get(headers, HEADER_USED)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        Some(Self {
            limit,
            remaining,
            reset,
            used,
        })
    }

    /// Header pairs suitable for forwarding to a downstream client.
    pub fn to_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_LIMIT, self.limit.to_string()),
            (HEADER_REMAINING, self.remaining.to_string()),
            (HEADER_RESET, self.reset.to_string()),
            (HEADER_USED, self.used.to_string()),
        ]
    }

    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn rate_limit_from_headers_defaults_used_to_zero() {
        let state = RateLimitState::from_headers(&headers(&[
            ("x-ratelimit-limit", "30"),
            ("x-ratelimit-remaining", "29"),
            ("x-ratelimit-reset", "1700000000"),
        ]))
        .expect("rate limit headers");

        assert_eq!(
            state,
            RateLimitState {
                limit: 30,
                remaining: 29,
                reset: 1_700_000_000,
                used: 0,
            }
        );
        assert!(!state.is_exhausted());
    }

    #[test]
    fn rate_limit_from_headers_requires_core_fields() {
        assert_eq!(
            RateLimitState::from_headers(&headers(&[
                ("X-RateLimit-Limit", "30"),
                ("X-RateLimit-Remaining", "0"),
            ])),
            None
        );
        assert_eq!(
            RateLimitState::from_headers(&headers(&[
                ("X-RateLimit-Limit", "thirty"),
                ("X-RateLimit-Remaining", "0"),
                ("X-RateLimit-Reset", "1"),
            ])),
            None
        );
    }

    #[test]
    fn rate_limit_reset_at_and_forwarding() {
        let state = RateLimitState {
            limit: 30,
            remaining: 0,
            reset: 1_700_000_000,
            used: 30,
        };
        assert!(state.is_exhausted());
        assert_eq!(state.reset_at().timestamp(), 1_700_000_000);
        assert_eq!(
            state.to_headers(),
            vec![
                ("X-RateLimit-Limit", "30".to_string()),
                ("X-RateLimit-Remaining", "0".to_string()),
                ("X-RateLimit-Reset", "1700000000".to_string()),
                ("X-RateLimit-Used", "30".to_string()),
            ]
        );
    }

    #[test]
    fn account_type_tolerates_unknown_values() {
        let kind: AccountType = serde_json::from_str("\"Bot\"").expect("account type");
        assert_eq!(kind, AccountType::Other);
        let kind: AccountType = serde_json::from_str("\"Organization\"").expect("account type");
        assert_eq!(kind, AccountType::Organization);
    }

    #[test]
    fn search_result_serializes_camel_case() {
        let result = SearchResult {
            users: Vec::new(),
            metadata: SearchMetadata {
                total_count: 1000,
                incomplete_results: false,
                current_page: 1,
                per_page: 30,
                has_next_page: true,
            },
        };
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["metadata"]["totalCount"], 1000);
        assert_eq!(json["metadata"]["hasNextPage"], true);
        assert_eq!(json["metadata"]["perPage"], 30);
    }
}
