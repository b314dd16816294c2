//! Integration tests for filter compilation, validation and result mapping.
//!
//! These run against the public API only and need no network access.

use usersearch::github::to_search_result;
use usersearch::github::types::{ApiUser, SearchResponse};
use usersearch::query::build;
use usersearch::{
    AccountType, DateRangeFilter, RangeFilter, SearchFilters, SearchInField, SortOption, UserType,
    ValidationErrorKind, validate,
};

fn filters(query: &str) -> SearchFilters {
    SearchFilters::new(query)
}

#[test]
fn full_filter_set_compiles_to_expected_query() {
    let filters = SearchFilters {
        query: "react developer".to_string(),
        user_type: Some(UserType::User),
        search_in: vec![SearchInField::Name, SearchInField::Email],
        repos: Some(RangeFilter::between(10, 100)),
        location: Some("San Francisco".to_string()),
        language: Some("JavaScript".to_string()),
        created: Some(DateRangeFilter {
            from: Some("2020-01-01".to_string()),
            to: Some("2023-12-31".to_string()),
            exact: None,
        }),
        followers: Some(RangeFilter::between(50, 500)),
        is_sponsored: Some(true),
        ..SearchFilters::default()
    };

    assert!(validate(&filters).is_ok());
    assert_eq!(
        build(&filters).q,
        "react developer type:user in:name in:email repos:10..100 \
         location:\"San Francisco\" language:JavaScript \
         created:2020-01-01..2023-12-31 followers:50..500 is:sponsorable"
    );
}

#[test]
fn same_filters_always_build_the_same_query() {
    let mut f = filters("rust");
    f.followers = Some(RangeFilter::at_most(10));
    f.sort = Some(SortOption::Followers);
    let first = build(&f);
    for _ in 0..10 {
        assert_eq!(build(&f), first);
    }
}

#[test]
fn repos_clause_precedes_location_in_builder_order() {
    let mut f = filters("developer");
    f.user_type = Some(UserType::User);
    f.location = Some("Seoul".to_string());
    f.repos = Some(RangeFilter::at_least(5));
    assert_eq!(build(&f).q, "developer type:user repos:>=5 location:Seoul");
}

#[test]
fn exact_range_wins_over_bounds() {
    let mut f = filters("x");
    f.repos = Some(RangeFilter {
        min: Some(10),
        max: Some(100),
        exact: Some(42),
    });
    assert_eq!(build(&f).q, "x repos:42");
}

#[test]
fn only_multi_word_values_are_quoted() {
    let mut f = filters("x");
    f.location = Some("San Francisco".to_string());
    assert_eq!(build(&f).q, "x location:\"San Francisco\"");

    f.location = Some("Seoul".to_string());
    assert_eq!(build(&f).q, "x location:Seoul");
}

#[test]
fn sponsorable_requires_explicit_true() {
    let mut f = filters("x");
    f.is_sponsored = Some(true);
    assert!(build(&f).q.contains("is:sponsorable"));

    f.is_sponsored = Some(false);
    assert_eq!(build(&f).q, "x");
}

#[test]
fn best_match_leaves_sort_unset() {
    let mut f = filters("x");
    f.sort = Some(SortOption::BestMatch);
    assert_eq!(build(&f).sort, None);
}

#[test]
fn page_ceiling_for_thirty_per_page() {
    let mut f = filters("x");
    f.per_page = Some(30);

    f.page = Some(34);
    let err = validate(&f).expect_err("page 34 is past 1000 results");
    assert_eq!(err.kind, ValidationErrorKind::PageTooHigh);
    assert_eq!(err.code(), "PAGE_TOO_HIGH");

    f.page = Some(33);
    assert!(validate(&f).is_ok());
}

#[test]
fn total_count_is_capped_before_deriving_next_page() {
    let items = (0..100)
        .map(|id| ApiUser {
            id,
            login: format!("user{id}"),
            avatar_url: String::new(),
            html_url: String::new(),
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
        })
        .collect();
    let response = SearchResponse {
        total_count: 5000,
        incomplete_results: false,
        items,
    };

    let result = to_search_result(response, 10, 100);
    assert_eq!(result.metadata.total_count, 1000);
    assert!(!result.metadata.has_next_page);
}
