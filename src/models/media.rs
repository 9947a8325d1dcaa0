//! Gallery media items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::services::store::not_blank;

/// Gallery category. Stored as lowercase text.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaCategory {
    Landscape,
    Portrait,
    Abstract,
    Nature,
    #[default]
    Other,
}

/// A single gallery item backed by one uploaded image.
#[derive(Serialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub title: String,

    /// Always `slugify(title)` as of the last save that changed the title.
    pub slug: String,
    pub description: Option<String>,

    /// Optional external link shown with the item.
    pub link: Option<String>,

    /// Public URL of the image.
    pub image: String,

    /// Stored upload name; the file is deleted together with the record.
    pub file_name: String,
    pub category: MediaCategory,
    pub tags: Json<Vec<String>>,
    pub featured: bool,

    /// Incremented on every detail read, public or admin.
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/media`.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMedia {
    #[validate(
        required,
        custom(function = "not_blank"),
        length(max = 100, message = "title cannot be more than 100 characters")
    )]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "description cannot be more than 500 characters"))]
    pub description: Option<String>,
    pub link: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub image: Option<String>,
    #[validate(
        required(message = "fileName"),
        custom(function = "not_blank", message = "fileName")
    )]
    pub file_name: Option<String>,
    pub category: Option<MediaCategory>,
    pub tags: Vec<String>,
    pub featured: Option<bool>,
}

/// Body of `PUT /api/admin/media/{id}`; absent fields are left unchanged.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MediaPatch {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "title cannot be more than 100 characters")
    )]
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "description cannot be more than 500 characters"))]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    #[validate(custom(function = "not_blank"))]
    pub image: Option<String>,
    #[validate(custom(function = "not_blank", message = "fileName"))]
    pub file_name: Option<String>,
    pub category: Option<MediaCategory>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
}

/// Filters for media listings.
#[derive(Debug, Default, Clone)]
pub struct MediaFilter {
    /// Exact category; values that match nothing yield an empty page.
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive substring over title, description and tags.
    pub search: Option<String>,
    pub featured_only: bool,
}
