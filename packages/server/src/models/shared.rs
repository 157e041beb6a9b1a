use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Largest row offset Postgres accepts (`OFFSET` is a bigint).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Normalize optional `page`/`per_page` query values to `(page >= 1, 1..=100)`.
///
/// `page` is capped so that [`page_offset`] stays within `MAX_OFFSET`.
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let max_page = MAX_OFFSET / per_page + 1;
    (page.unwrap_or(1).clamp(1, max_page), per_page)
}

/// Rows to skip for a page returned by [`page_params`].
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page).min(MAX_OFFSET)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed title (1-255 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 255 {
        return Err(AppError::Validation(
            "title: must be 1-255 characters".into(),
        ));
    }
    Ok(())
}

/// Validate an optional URL field (at most 2048 characters, http(s) scheme).
pub fn validate_optional_url(url: Option<&str>, field: &str) -> Result<(), AppError> {
    if let Some(url) = url {
        if url.len() > 2048 {
            return Err(AppError::Validation(format!(
                "{field}: must be at most 2048 characters"
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Validation(format!(
                "{field}: must be an http(s) URL"
            )));
        }
    }
    Ok(())
}
