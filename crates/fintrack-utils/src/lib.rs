//! Utility functions and helpers

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Number of pages needed to show `total` items at `limit` per page
pub fn page_count(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Offset of the first item on a 1-based `page`
pub fn page_offset(page: usize, limit: usize) -> usize {
    page.saturating_sub(1).saturating_mul(limit)
}

/// Grouping key for a calendar month, e.g. "2024-03"
pub fn month_key(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Trim labels, drop empty ones and collapse duplicates
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Generate a unique record ID
pub fn generate_id() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}
