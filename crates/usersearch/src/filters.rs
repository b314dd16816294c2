//! Structured search filters and the query they compile to.
//!
//! [`SearchFilters`] mirrors the JSON body accepted by the HTTP surface
//! (camelCase field names), while [`SearchQuery`] holds the parameters that
//! end up in the search URL.

use serde::{Deserialize, Serialize};

/// Account kind qualifier (`type:user` / `type:org`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Org,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Org => "org",
        }
    }
}

/// Field restriction for the free-text part of the query (`in:login`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchInField {
    Login,
    Name,
    Email,
}

impl SearchInField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    BestMatch,
    Followers,
    Repositories,
    Joined,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestMatch => "best-match",
            Self::Followers => "followers",
            Self::Repositories => "repositories",
            Self::Joined => "joined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Numeric range qualifier. `exact` takes precedence over the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<u64>,
}

impl RangeFilter {
    pub fn exact(value: u64) -> Self {
        Self {
            exact: Some(value),
            ..Self::default()
        }
    }

    pub fn between(min: u64, max: u64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            exact: None,
        }
    }

    pub fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn at_most(max: u64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }
}

/// Date range qualifier with `YYYY-MM-DD` bounds. `exact` takes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRangeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
}

/// Everything a caller can ask for in one user search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub query: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_in: Vec<SearchInField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos: Option<RangeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<RangeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateRangeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sponsored: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl SearchFilters {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Compiled search parameters.
///
/// `sort` is `None` for best-match ordering, which is the engine default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl SearchQuery {
    /// URL parameters in a stable order, omitting anything undefined.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_deserialize_from_camel_case_body() {
        let filters: SearchFilters = serde_json::from_value(serde_json::json!({
            "query": "rust",
            "type": "org",
            "searchIn": ["login", "email"],
            "repos": { "min": 5 },
            "isSponsored": true,
            "sort": "best-match",
            "sortOrder": "asc",
            "perPage": 50
        }))
        .expect("valid filters");

        assert_eq!(filters.query, "rust");
        assert_eq!(filters.user_type, Some(UserType::Org));
        assert_eq!(
            filters.search_in,
            vec![SearchInField::Login, SearchInField::Email]
        );
        assert_eq!(filters.repos, Some(RangeFilter::at_least(5)));
        assert_eq!(filters.is_sponsored, Some(true));
        assert_eq!(filters.sort, Some(SortOption::BestMatch));
        assert_eq!(filters.sort_order, Some(SortOrder::Asc));
        assert_eq!(filters.per_page, Some(50));
        assert_eq!(filters.page, None);
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let result: Result<SearchFilters, _> = serde_json::from_value(serde_json::json!({
            "query": "rust",
            "type": "bot"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn query_pairs_skip_undefined_params() {
        let query = SearchQuery {
            q: "rust".to_string(),
            ..SearchQuery::default()
        };
        assert_eq!(query.to_query_pairs(), vec![("q", "rust".to_string())]);

        let query = SearchQuery {
            q: "rust".to_string(),
            sort: Some("followers".to_string()),
            order: Some(SortOrder::Desc),
            page: Some(2),
            per_page: Some(30),
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("q", "rust".to_string()),
                ("sort", "followers".to_string()),
                ("order", "desc".to_string()),
                ("page", "2".to_string()),
                ("per_page", "30".to_string()),
            ]
        );
    }

    #[test]
    fn sort_option_wire_names() {
        assert_eq!(SortOption::BestMatch.as_str(), "best-match");
        assert_eq!(
            serde_json::to_value(SortOption::Repositories).expect("serialize"),
            serde_json::json!("repositories")
        );
    }
}
