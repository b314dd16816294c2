//! Search orchestration and infinite-scroll paging state.

use tracing::{debug, info};

use crate::error::SearchError;
use crate::filters::{SearchFilters, SortOption, SortOrder};
use crate::github::GitHubClient;
use crate::model::{RateLimitState, SearchMetadata, SearchOutcome, SearchResult, UserRecord};
use crate::query;
use crate::retry::CancelToken;
use crate::validation::{DEFAULT_PER_PAGE, max_page, validate};

/// Fill in defaults the engine would otherwise pick implicitly.
///
/// Trims the query and defaults to page 1, the default page size,
/// best-match sorting and descending order.
pub fn normalize(filters: SearchFilters) -> SearchFilters {
    SearchFilters {
        query: filters.query.trim().to_string(),
        page: Some(filters.page.unwrap_or(1)),
        per_page: Some(filters.per_page.unwrap_or(DEFAULT_PER_PAGE)),
        sort: Some(filters.sort.unwrap_or(SortOption::BestMatch)),
        sort_order: Some(filters.sort_order.unwrap_or(SortOrder::Desc)),
        ..filters
    }
}

/// Validates, compiles and executes searches.
#[derive(Clone)]
pub struct SearchService {
    client: GitHubClient,
}

impl SearchService {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Run one search. Invalid filters are rejected before any request.
    pub async fn search(
        &self,
        filters: &SearchFilters,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        validate(filters)?;
        let filters = normalize(filters.clone());
        let query = query::build(&filters);
        info!(q = %query.q, page = ?query.page, per_page = ?query.per_page, "Searching users");

        let outcome = self.client.search_users(&query, cancel).await?;
        debug!(
            users = outcome.result.users.len(),
            total = outcome.result.metadata.total_count,
            has_next_page = outcome.result.metadata.has_next_page,
            "Search page received"
        );
        Ok(outcome)
    }

    pub async fn rate_limit(&self, cancel: &CancelToken) -> Result<RateLimitState, SearchError> {
        Ok(self.client.get_rate_limit(cancel).await?)
    }

    /// Fetch the next page of `session`, if there is one.
    ///
    /// Returns `Ok(false)` when the session has nothing more to load. A failed
    /// page stops the session.
    pub async fn load_next(
        &self,
        session: &mut SearchSession,
        cancel: &CancelToken,
    ) -> Result<bool, SearchError> {
        let Some(request) = session.next_request() else {
            return Ok(false);
        };
        match self.search(&request.filters, cancel).await {
            Ok(outcome) => Ok(session.apply(request.generation, outcome.result)),
            Err(e) => {
                session.fail(request.generation);
                Err(e)
            }
        }
    }
}

/// A page to fetch, tagged with the generation of the filters it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub filters: SearchFilters,
}

/// Accumulated results of one search across pages.
///
/// Changing the filters starts a new generation; results that arrive for an
/// older generation are dropped.
#[derive(Debug, Clone)]
pub struct SearchSession {
    filters: SearchFilters,
    users: Vec<UserRecord>,
    metadata: Option<SearchMetadata>,
    has_more: bool,
    next_page: u32,
    generation: u64,
}

impl SearchSession {
    pub fn new(filters: SearchFilters) -> Self {
        Self {
            filters,
            users: Vec::new(),
            metadata: None,
            has_more: true,
            next_page: 1,
            generation: 0,
        }
    }

    /// Replace the filters and start over from page 1.
    pub fn update_filters(&mut self, filters: SearchFilters) {
        self.filters = filters;
        self.users.clear();
        self.metadata = None;
        self.has_more = true;
        self.next_page = 1;
        self.generation += 1;
    }

    pub fn next_request(&self) -> Option<PageRequest> {
        if !self.has_more {
            return None;
        }
        Some(PageRequest {
            generation: self.generation,
            filters: SearchFilters {
                page: Some(self.next_page),
                ..self.filters.clone()
            },
        })
    }

    /// Merge a page into the session. Returns `false` if the page belongs to
    /// an older generation and was ignored.
    pub fn apply(&mut self, generation: u64, result: SearchResult) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Dropping stale search page"
            );
            return false;
        }

        let metadata = result.metadata;
        if metadata.current_page <= 1 {
            self.users = result.users;
        } else {
            self.users.extend(result.users);
        }

        self.next_page = metadata.current_page.saturating_add(1);
        // A page past the ceiling would be rejected by validation.
        self.has_more =
            metadata.has_next_page && self.next_page <= max_page(Some(metadata.per_page));
        self.metadata = Some(metadata);
        true
    }

    /// Stop paging after a failed request for the current generation.
    pub fn fail(&mut self, generation: u64) {
        if generation == self.generation {
            self.has_more = false;
        }
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn metadata(&self) -> Option<&SearchMetadata> {
        self.metadata.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ClientConfig;
    use crate::http::{HttpResponse, MockTransport};
    use crate::model::AccountType;
    use crate::retry::RetryConfig;
    use std::sync::Arc;

    fn user(login: &str) -> UserRecord {
        UserRecord {
            id: 1,
            login: login.to_string(),
            avatar_url: String::new(),
            html_url: format!("https://github.com/{login}"),
            account_type: AccountType::User,
            name: None,
            company: None,
            blog: None,
            location: None,
            email: None,
            bio: None,
            public_repos: None,
            public_gists: None,
            followers: None,
            following: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn result(page: u32, per_page: u32, logins: &[&str], has_next_page: bool) -> SearchResult {
        SearchResult {
            users: logins.iter().map(|l| user(l)).collect(),
            metadata: SearchMetadata {
                total_count: 1000,
                incomplete_results: false,
                current_page: page,
                per_page,
                has_next_page,
            },
        }
    }

    #[test]
    fn normalize_fills_defaults_and_trims() {
        let filters = normalize(SearchFilters::new("  rust  "));
        assert_eq!(filters.query, "rust");
        assert_eq!(filters.page, Some(1));
        assert_eq!(filters.per_page, Some(30));
        assert_eq!(filters.sort, Some(SortOption::BestMatch));
        assert_eq!(filters.sort_order, Some(SortOrder::Desc));

        let mut custom = SearchFilters::new("x");
        custom.page = Some(3);
        custom.sort_order = Some(SortOrder::Asc);
        let filters = normalize(custom);
        assert_eq!(filters.page, Some(3));
        assert_eq!(filters.sort_order, Some(SortOrder::Asc));
    }

    #[test]
    fn first_page_replaces_later_pages_append() {
        let mut session = SearchSession::new(SearchFilters::new("x"));
        let req = session.next_request().expect("first page");
        assert_eq!(req.filters.page, Some(1));

        assert!(session.apply(req.generation, result(1, 2, &["a", "b"], true)));
        assert_eq!(session.users().len(), 2);
        assert!(session.has_more());

        let req = session.next_request().expect("second page");
        assert_eq!(req.filters.page, Some(2));
        assert!(session.apply(req.generation, result(2, 2, &["c"], false)));
        let logins: Vec<&str> = session.users().iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["a", "b", "c"]);
        assert!(!session.has_more());
        assert_eq!(session.next_request(), None);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut session = SearchSession::new(SearchFilters::new("old"));
        let stale = session.next_request().expect("page");

        session.update_filters(SearchFilters::new("new"));
        assert_eq!(session.generation(), 1);
        assert!(!session.apply(stale.generation, result(1, 30, &["ghost"], true)));
        assert!(session.users().is_empty());

        session.fail(stale.generation);
        assert!(session.has_more());

        let fresh = session.next_request().expect("page");
        assert_eq!(fresh.filters.query, "new");
        assert!(session.apply(fresh.generation, result(1, 30, &["real"], false)));
        assert_eq!(session.users()[0].login, "real");
    }

    #[test]
    fn update_filters_resets_paging() {
        let mut session = SearchSession::new(SearchFilters::new("x"));
        let req = session.next_request().expect("page");
        session.apply(req.generation, result(1, 1, &["a"], false));
        assert!(!session.has_more());

        session.update_filters(SearchFilters::new("y"));
        assert!(session.has_more());
        assert!(session.metadata().is_none());
        assert_eq!(
            session.next_request().and_then(|r| r.filters.page),
            Some(1)
        );
    }

    #[test]
    fn paging_stops_at_the_result_ceiling() {
        let mut session = SearchSession::new(SearchFilters::new("x"));
        let req = session.next_request().expect("page");
        // Page 33 of 30 reports more results, but page 34 is past 1000.
        assert!(session.apply(req.generation, result(33, 30, &["a"], true)));
        assert!(!session.has_more());
    }

    #[test]
    fn failure_stops_current_generation() {
        let mut session = SearchSession::new(SearchFilters::new("x"));
        let req = session.next_request().expect("page");
        session.fail(req.generation);
        assert!(!session.has_more());
    }

    fn service(transport: &MockTransport) -> SearchService {
        let config = ClientConfig::new("t")
            .with_api_url("https://api.test")
            .with_retry(RetryConfig::default().with_jitter(false));
        SearchService::new(GitHubClient::new_with_transport(
            config,
            Arc::new(transport.clone()),
        ))
    }

    fn search_response(total: u64, count: usize) -> HttpResponse {
        let items: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": i,
                    "login": format!("u{i}"),
                    "avatar_url": "",
                    "html_url": "",
                    "type": "User"
                })
            })
            .collect();
        HttpResponse {
            status: 200,
            headers: vec![
                ("X-RateLimit-Limit".to_string(), "30".to_string()),
                ("X-RateLimit-Remaining".to_string(), "28".to_string()),
                ("X-RateLimit-Reset".to_string(), "1700000000".to_string()),
            ],
            body: serde_json::json!({
                "total_count": total,
                "incomplete_results": false,
                "items": items
            })
            .to_string()
            .into_bytes(),
        }
    }

    #[tokio::test]
    async fn invalid_filters_never_reach_the_network() {
        let transport = MockTransport::new();
        let service = service(&transport);

        let err = service
            .search(&SearchFilters::new("   "), &CancelToken::new())
            .await
            .expect_err("blank query");
        assert_eq!(err.code(), "MISSING_QUERY");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn search_normalizes_before_building_the_url() {
        let transport = MockTransport::new();
        let service = service(&transport);
        transport.set_fallback(search_response(2, 2));

        let outcome = service
            .search(&SearchFilters::new("  rust "), &CancelToken::new())
            .await
            .expect("search succeeds");

        assert_eq!(outcome.result.users.len(), 2);
        assert_eq!(outcome.rate_limit.map(|r| r.remaining), Some(28));

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://api.test/search/users?q=rust&order=desc&page=1&per_page=30"
        );
    }

    #[tokio::test]
    async fn load_next_walks_pages_until_exhausted() {
        let transport = MockTransport::new();
        let service = service(&transport);

        let mut filters = SearchFilters::new("rust");
        filters.per_page = Some(2);
        let mut session = SearchSession::new(filters);

        let client = service.client().clone();
        for page in 1..=2u32 {
            let mut query_filters = normalize(session.filters().clone());
            query_filters.page = Some(page);
            let url = client.search_url(&query::build(&query_filters));
            transport.push_response(url, search_response(3, if page == 1 { 2 } else { 1 }));
        }

        let token = CancelToken::new();
        assert!(service.load_next(&mut session, &token).await.expect("page 1"));
        assert!(session.has_more());
        assert!(service.load_next(&mut session, &token).await.expect("page 2"));
        assert!(!session.has_more());
        assert!(!service.load_next(&mut session, &token).await.expect("done"));

        assert_eq!(session.users().len(), 3);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn load_next_failure_stops_the_session() {
        let transport = MockTransport::new();
        let service = service(&transport);
        transport.set_fallback(HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: br#"{"message":"Bad credentials"}"#.to_vec(),
        });

        let mut session = SearchSession::new(SearchFilters::new("rust"));
        let err = service
            .load_next(&mut session, &CancelToken::new())
            .await
            .expect_err("auth failure");
        assert_eq!(err.code(), "AUTHENTICATION_FAILED");
        assert!(!session.has_more());
    }
}
