//! Conversion from GitHub wire types to internal models.

use super::types::{ApiUser, RateLimitResponse, SearchResponse};
use crate::model::{RateLimitState, SearchMetadata, SearchResult, UserRecord};
use crate::validation::RESULT_CEILING;

/// Convert a wire user to the internal record. Fields map one to one.
pub fn to_user_record(user: ApiUser) -> UserRecord {
    UserRecord {
        id: user.id,
        login: user.login,
        avatar_url: user.avatar_url,
        html_url: user.html_url,
        account_type: user.account_type,
        name: user.name,
        company: user.company,
        blog: user.blog,
        location: user.location,
        email: user.email,
        bio: user.bio,
        public_repos: user.public_repos,
        public_gists: user.public_gists,
        followers: user.followers,
        following: user.following,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Convert a search page, deriving pagination metadata.
///
/// `total_count` is capped at [`RESULT_CEILING`] and `has_next_page` is
/// computed against the capped value: a full page that does not yet reach
/// the ceiling.
pub fn to_search_result(response: SearchResponse, current_page: u32, per_page: u32) -> SearchResult {
    let total_count = response.total_count.min(RESULT_CEILING);
    let item_count = response.items.len() as u64;
    let has_next_page = item_count >= u64::from(per_page)
        && u64::from(current_page) * u64::from(per_page) < total_count;

    SearchResult {
        users: response.items.into_iter().map(to_user_record).collect(),
        metadata: SearchMetadata {
            total_count,
            incomplete_results: response.incomplete_results,
            current_page,
            per_page,
            has_next_page,
        },
    }
}

/// Extract the search bucket from a `GET /rate_limit` response.
pub fn to_rate_limit(response: &RateLimitResponse) -> RateLimitState {
    let search = &response.resources.search;
    RateLimitState {
        limit: search.limit,
        remaining: search.remaining,
        reset: search.reset,
        used: search.used,
    }
}
