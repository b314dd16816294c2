//! Filter validation, run before any request leaves the process.

use chrono::NaiveDate;
use thiserror::Error;

use crate::filters::{RangeFilter, SearchFilters};

/// Maximum length of the free-text query, in characters.
pub const MAX_QUERY_LENGTH: usize = 256;

/// The search engine never returns more than this many results per query.
pub const RESULT_CEILING: u64 = 1000;

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingQuery,
    QueryTooLong,
    InvalidPage,
    PageTooHigh,
    InvalidPerPage,
    InvalidRange,
    InvalidDateFormat,
}

impl ValidationErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingQuery => "MISSING_QUERY",
            Self::QueryTooLong => "QUERY_TOO_LONG",
            Self::InvalidPage => "INVALID_PAGE",
            Self::PageTooHigh => "PAGE_TOO_HIGH",
            Self::InvalidPerPage => "INVALID_PER_PAGE",
            Self::InvalidRange => "INVALID_RANGE",
            Self::InvalidDateFormat => "INVALID_DATE_FORMAT",
        }
    }
}

/// A rejected filter set. `field` names the offending input (`repos.min`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            field,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status(&self) -> u16 {
        400
    }
}

/// Highest page reachable for a page size without crossing [`RESULT_CEILING`].
///
/// A page size of zero falls back to the default.
pub fn max_page(per_page: Option<u32>) -> u32 {
    let per_page = match per_page {
        Some(0) | None => DEFAULT_PER_PAGE,
        Some(n) => n,
    };
    (RESULT_CEILING / u64::from(per_page)) as u32
}

/// Check a filter set. Rules are evaluated in a fixed order and the first
/// failure is returned.
pub fn validate(filters: &SearchFilters) -> Result<(), ValidationError> {
    if filters.query.trim().is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingQuery,
            "query",
            "Search query is required",
        ));
    }

    if filters.query.chars().count() > MAX_QUERY_LENGTH {
        return Err(ValidationError::new(
            ValidationErrorKind::QueryTooLong,
            "query",
            format!("Search query is too long (max {MAX_QUERY_LENGTH} characters)"),
        ));
    }

    if let Some(page) = filters.page {
        if page == 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidPage,
                "page",
                "Page must be a positive integer",
            ));
        }

        let max = max_page(filters.per_page);
        if page > max {
            return Err(ValidationError::new(
                ValidationErrorKind::PageTooHigh,
                "page",
                format!("Page number too high (max {max} for current perPage)"),
            ));
        }
    }

    if let Some(per_page) = filters.per_page
        && !(1..=MAX_PER_PAGE).contains(&per_page)
    {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidPerPage,
            "perPage",
            format!("perPage must be between 1 and {MAX_PER_PAGE}"),
        ));
    }

    if let Some(repos) = &filters.repos {
        check_range(repos, "repos.min", "repos")?;
    }
    if let Some(followers) = &filters.followers {
        check_range(followers, "followers.min", "followers")?;
    }

    if let Some(created) = &filters.created {
        let bounds = [
            ("created.from", &created.from),
            ("created.to", &created.to),
            ("created.exact", &created.exact),
        ];
        for (field, value) in bounds {
            if let Some(value) = value.as_deref().filter(|s| !s.is_empty())
                && !is_valid_date(value)
            {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidDateFormat,
                    field,
                    format!("Invalid date format for {field} (use YYYY-MM-DD)"),
                ));
            }
        }
    }

    Ok(())
}

fn check_range(
    range: &RangeFilter,
    field: &'static str,
    name: &str,
) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (range.min, range.max)
        && min > max
    {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidRange,
            field,
            format!("{name}.min cannot be greater than {name}.max"),
        ));
    }
    Ok(())
}

/// `YYYY-MM-DD` with ASCII digits that names a real calendar day.
pub fn is_valid_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
