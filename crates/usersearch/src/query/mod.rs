//! Compiles [`SearchFilters`] into a search query string.
//!
//! Clauses are emitted in a fixed order and joined by single spaces:
//!
//! 1. free text
//! 2. `type:`
//! 3. one `in:` per requested field
//! 4. `repos:`
//! 5. `location:`
//! 6. `language:`
//! 7. `created:`
//! 8. `followers:`
//! 9. `is:sponsorable`

pub mod clause;

pub use clause::{date_range_clause, escape_value, range_clause};

use crate::filters::{SearchFilters, SearchQuery, SortOption};

/// Build the query for a set of filters. Pure and total: never fails.
pub fn build(filters: &SearchFilters) -> SearchQuery {
    let mut parts: Vec<String> = Vec::new();

    if !filters.query.is_empty() {
        parts.push(filters.query.clone());
    }

    if let Some(user_type) = filters.user_type {
        parts.push(format!("type:{}", user_type.as_str()));
    }

    for field in &filters.search_in {
        parts.push(format!("in:{}", field.as_str()));
    }

    if let Some(clause) = filters
        .repos
        .as_ref()
        .and_then(|r| range_clause("repos", r))
    {
        parts.push(clause);
    }

    if let Some(location) = filters.location.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("location:{}", escape_value(location)));
    }

    if let Some(language) = filters.language.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("language:{}", escape_value(language)));
    }

    if let Some(clause) = filters
        .created
        .as_ref()
        .and_then(|d| date_range_clause("created", d))
    {
        parts.push(clause);
    }

    if let Some(clause) = filters
        .followers
        .as_ref()
        .and_then(|r| range_clause("followers", r))
    {
        parts.push(clause);
    }

    if filters.is_sponsored == Some(true) {
        parts.push("is:sponsorable".to_string());
    }

    SearchQuery {
        q: parts.join(" "),
        sort: filters
            .sort
            .filter(|s| *s != SortOption::BestMatch)
            .map(|s| s.as_str().to_string()),
        order: filters.sort_order,
        page: filters.page,
        per_page: filters.per_page,
    }
}
