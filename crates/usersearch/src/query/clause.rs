//! Qualifier encoding for range and date filters.

use crate::filters::{DateRangeFilter, RangeFilter};

/// Encode a numeric range as a qualifier, or `None` when no bound is set.
///
/// Priority: `exact`, then `min..max`, then `>=min`, then `<=max`.
pub fn range_clause(field: &str, range: &RangeFilter) -> Option<String> {
    if let Some(exact) = range.exact {
        return Some(format!("{field}:{exact}"));
    }
    match (range.min, range.max) {
        (Some(min), Some(max)) => Some(format!("{field}:{min}..{max}")),
        (Some(min), None) => Some(format!("{field}:>={min}")),
        (None, Some(max)) => Some(format!("{field}:<={max}")),
        (None, None) => None,
    }
}

/// Encode a date range as a qualifier. Empty strings count as absent.
pub fn date_range_clause(field: &str, range: &DateRangeFilter) -> Option<String> {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

    if let Some(exact) = present(&range.exact) {
        return Some(format!("{field}:{exact}"));
    }
    match (present(&range.from), present(&range.to)) {
        (Some(from), Some(to)) => Some(format!("{field}:{from}..{to}")),
        (Some(from), None) => Some(format!("{field}:>={from}")),
        (None, Some(to)) => Some(format!("{field}:<={to}")),
        (None, None) => None,
    }
}

/// Quote a qualifier value if it contains a space. Nothing else is escaped.
pub fn escape_value(value: &str) -> String {
    if value.contains(' ') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
