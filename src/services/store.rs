//! Pieces shared by the four resource stores: the error type, slug
//! resolution and uniqueness checks, folding of `validator` failures and
//! LIKE-pattern escaping.

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::utils::slug::slugify;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("slug `{0}` already exists")]
    SlugConflict(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables that carry a unique `slug` column.
#[derive(Debug, Clone, Copy)]
pub enum SlugTable {
    Blogs,
    Media,
    Firms,
    Partners,
}

impl SlugTable {
    fn name(self) -> &'static str {
        match self {
            SlugTable::Blogs => "blogs",
            SlugTable::Media => "media",
            SlugTable::Firms => "firms",
            SlugTable::Partners => "partners",
        }
    }
}

/// Pick the slug for a write: an explicit slug wins (normalized), otherwise
/// it is derived from `source`. An empty result is a validation error.
pub fn resolve_slug(explicit: Option<&str>, source: Option<&str>) -> StoreResult<String> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => source.map(slugify).unwrap_or_default(),
    };
    if slug.is_empty() {
        return Err(StoreError::Validation(
            "slug: a slug or a name containing letters or digits is required".into(),
        ));
    }
    Ok(slug)
}

/// Early, friendly duplicate-slug rejection. The unique index on each table
/// is what actually guarantees uniqueness; see [`map_unique_violation`].
///
/// `exclude` is the id of the document being updated, which may keep its own slug.
pub async fn ensure_slug_available(
    db: &SqlitePool,
    table: SlugTable,
    slug: &str,
    exclude: Option<Uuid>,
) -> StoreResult<()> {
    let sql = format!("SELECT id FROM {} WHERE slug = ?", table.name());
    let holder: Option<Uuid> = sqlx::query_scalar(&sql)
        .bind(slug)
        .fetch_optional(db)
        .await?;

    match holder {
        Some(id) if Some(id) != exclude => Err(StoreError::SlugConflict(slug.to_string())),
        _ => Ok(()),
    }
}

/// Translate a unique-constraint violation on write into a slug conflict.
pub fn map_unique_violation(err: sqlx::Error, slug: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::SlugConflict(slug.to_string())
    } else {
        StoreError::Sqlx(err)
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Error code shared by `required` and [`not_blank`] failures.
const REQUIRED: &str = "required";

/// `validator` check for string fields that must carry text when present.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(REQUIRED));
    }
    Ok(())
}

/// Fold `validator` failures into one message. Missing fields are reported
/// together as `Missing required fields: a, b`; a field's `message`, when
/// set on a `required` rule, names it as the client spells it.
impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        let mut missing = Vec::new();
        let mut other = Vec::new();
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure.message.as_ref().map(|m| m.to_string());
                if failure.code == REQUIRED {
                    missing.push(message.unwrap_or_else(|| field.to_string()));
                } else {
                    other.push(message.unwrap_or_else(|| format!("{field} is invalid")));
                }
            }
        }
        missing.sort();
        missing.dedup();
        other.sort();

        if missing.is_empty() {
            StoreError::Validation(other.join("; "))
        } else {
            StoreError::Validation(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}

/// Trim a string, mapping blank to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a tag/category list into a set: trimmed, non-blank, first
/// occurrence wins.
pub fn normalize_set(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Build a `%term%` pattern for a case-insensitive `LIKE ... ESCAPE '\'` match.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
