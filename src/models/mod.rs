//! Data models for the site's four resources.
//!
//! Entities map to SQLite rows via `sqlx::FromRow` and serialize as JSON via
//! `serde`. Every write goes through a typed input struct that rejects
//! unknown fields.

pub mod blog;
pub mod firm;
pub mod media;
pub mod partner;

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::pagination::Pagination;

/// One page of a list endpoint.
#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// `{ "id": ... }` body used by the id-in-body admin endpoints.
#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct IdBody {
    pub id: Option<String>,
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
