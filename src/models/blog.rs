//! Blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

use crate::services::store::not_blank;

/// A published (or draft) blog post.
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,

    /// Unique across all blogs.
    pub slug: String,
    pub excerpt: String,

    /// Rich-text body as authored in the admin editor.
    pub content: String,
    pub featured_image: String,
    pub author: String,
    pub categories: Json<Vec<String>>,
    pub tags: Json<Vec<String>>,
    pub is_published: bool,

    /// Publish date; defaults to the creation time.
    pub published_at: DateTime<Utc>,
    pub meta_title: String,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/blogs` and `PUT /api/admin/blogs/{id}`.
///
/// Blog writes always carry the full field set. Required strings are
/// optional here so that every missing one can be reported together.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct BlogInput {
    #[validate(required, custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub slug: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub excerpt: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub content: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub featured_image: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Filters for blog listings.
#[derive(Debug, Default, Clone)]
pub struct BlogFilter {
    /// Only posts whose categories contain this value.
    pub category: Option<String>,
    /// Only posts whose tags contain this value.
    pub tag: Option<String>,
    /// Sort by publish date (public listings) instead of creation date.
    pub by_publish_date: bool,
}

/// A post together with up to three related posts.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    pub blog: Blog,
    pub related_blogs: Vec<Blog>,
}
