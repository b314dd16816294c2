//! Parsing of untyped JSON search requests into [`SearchFilters`].
//!
//! This layer only checks shapes and numeric types. Semantic rules (page
//! ceiling, `min <= max`, dates) belong to [`crate::validation::validate`].

use serde_json::{Map, Value};

use crate::error::SearchError;
use crate::filters::SearchFilters;
use crate::validation::{MAX_QUERY_LENGTH, MAX_PER_PAGE, ValidationError, ValidationErrorKind};

const RANGE_FIELDS: [(&str, [(&str, &str); 3]); 2] = [
    (
        "repos",
        [("min", "repos.min"), ("max", "repos.max"), ("exact", "repos.exact")],
    ),
    (
        "followers",
        [
            ("min", "followers.min"),
            ("max", "followers.max"),
            ("exact", "followers.exact"),
        ],
    ),
];

fn rejected(kind: ValidationErrorKind, field: &'static str, message: String) -> SearchError {
    SearchError::Validation(ValidationError::new(kind, field, message))
}

/// Parse a request body into filters.
///
/// Whole-valued floats such as `2.0` are accepted wherever an integer is
/// expected. A `null` field is treated as absent.
pub fn parse_search_request(body: &[u8]) -> Result<SearchFilters, SearchError> {
    let mut value: Value =
        serde_json::from_slice(body).map_err(|e| SearchError::InvalidJson(e.to_string()))?;
    let Some(object) = value.as_object_mut() else {
        return Err(SearchError::InvalidJson(
            "request body must be a JSON object".to_string(),
        ));
    };

    check_query(object)?;

    if let Some(raw) = present(object, "page") {
        let page = as_non_negative_integer(raw)
            .filter(|p| *p >= 1)
            .ok_or_else(|| {
                rejected(
                    ValidationErrorKind::InvalidPage,
                    "page",
                    "Page must be a positive integer".to_string(),
                )
            })?;
        // Anything past u32 is far beyond the page ceiling anyway.
        let page = u32::try_from(page).unwrap_or(u32::MAX);
        object.insert("page".to_string(), Value::from(page));
    }

    if let Some(raw) = present(object, "perPage") {
        let per_page = as_non_negative_integer(raw)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                rejected(
                    ValidationErrorKind::InvalidPerPage,
                    "perPage",
                    format!("perPage must be between 1 and {MAX_PER_PAGE}"),
                )
            })?;
        object.insert("perPage".to_string(), Value::from(per_page));
    }

    for (name, bounds) in RANGE_FIELDS {
        let range = match object.get_mut(name) {
            None | Some(Value::Null) => continue,
            Some(Value::Object(range)) => range,
            Some(_) => {
                return Err(SearchError::InvalidJson(format!("{name} must be an object")));
            }
        };
        for (key, field) in bounds {
            let Some(raw) = present(range, key) else {
                continue;
            };
            let n = as_non_negative_integer(raw).ok_or_else(|| {
                rejected(
                    ValidationErrorKind::InvalidRange,
                    field,
                    format!("{field} must be a non-negative integer"),
                )
            })?;
            range.insert(key.to_string(), Value::from(n));
        }
    }

    serde_json::from_value(value).map_err(|e| SearchError::InvalidJson(e.to_string()))
}

fn check_query(object: &Map<String, Value>) -> Result<(), SearchError> {
    match present(object, "query") {
        None => Err(rejected(
            ValidationErrorKind::MissingQuery,
            "query",
            "Search query is required".to_string(),
        )),
        Some(Value::String(query)) if query.trim().is_empty() => Err(rejected(
            ValidationErrorKind::MissingQuery,
            "query",
            "Search query is required".to_string(),
        )),
        Some(Value::String(query)) if query.chars().count() > MAX_QUERY_LENGTH => Err(rejected(
            ValidationErrorKind::QueryTooLong,
            "query",
            format!("Search query is too long (max {MAX_QUERY_LENGTH} characters)"),
        )),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(SearchError::InvalidJson("query must be a string".to_string())),
    }
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn as_non_negative_integer(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    // Whole floats past u64::MAX saturate; `as` clamps.
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    })
}
