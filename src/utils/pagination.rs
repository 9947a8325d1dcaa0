//! Page window math and query-string page/limit parsing.

use serde::Serialize;

/// Default page size for blog listings.
pub const BLOG_PAGE_SIZE: u64 = 10;
/// Default page size for media, firm and partner listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Upper bound on a caller-supplied `limit`.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination metadata returned alongside every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    /// Rows to skip before this page starts. Not part of the response body.
    #[serde(skip)]
    pub skip: u64,
}

impl Pagination {
    /// `skip` as an SQLite `OFFSET`. Pages past `i64::MAX` rows clamp to
    /// the largest offset instead of wrapping negative.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    /// `limit` as an SQLite `LIMIT`.
    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }
}

/// Compute the window for `page` (1-based) of `limit` rows out of `total`.
///
/// `page` and `limit` below 1 are treated as 1.
pub fn paginate(total: u64, page: u64, limit: u64) -> Pagination {
    let page = page.max(1);
    let limit = limit.max(1);
    Pagination {
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
        skip: (page - 1).saturating_mul(limit),
    }
}

/// Resolve raw `page`/`limit` query values into numbers.
///
/// Missing, non-numeric or zero values fall back to page 1 and
/// `default_limit`; the limit is capped at [`MAX_PAGE_SIZE`].
pub fn resolve_page(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> (u64, u64) {
    let page = parse_positive(page).unwrap_or(1);
    let limit = parse_positive(limit)
        .unwrap_or(default_limit)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}
