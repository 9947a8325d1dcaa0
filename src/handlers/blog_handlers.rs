//! Blog endpoints: public reads under `/api/blogs`, admin CRUD under
//! `/api/admin/blogs`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    auth::AdminUser,
    errors::AppError,
    extractors::{AppJson, parse_id},
    handlers::Deleted,
    models::{
        Page,
        blog::{Blog, BlogDetail, BlogFilter, BlogInput},
    },
    services::store::non_blank,
    state::AppState,
    utils::pagination::{BLOG_PAGE_SIZE, resolve_page},
};

/// Query params accepted by both blog listings.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BlogListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl BlogListQuery {
    fn into_filter(self, by_publish_date: bool) -> (BlogFilter, u64, u64) {
        let (page, limit) = resolve_page(self.page.as_deref(), self.limit.as_deref(), BLOG_PAGE_SIZE);
        let filter = BlogFilter {
            category: non_blank(self.category),
            tag: non_blank(self.tag),
            by_publish_date,
        };
        (filter, page, limit)
    }
}

/// `GET /api/blogs`: newest publish date first.
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<Page<Blog>>, AppError> {
    let (filter, page, limit) = query.into_filter(true);
    Ok(Json(state.blogs.list(&filter, page, limit).await?))
}

/// `GET /api/blogs/{slug}`
pub async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogDetail>, AppError> {
    Ok(Json(state.blogs.detail_by_slug(&slug).await?))
}

/// `GET /api/admin/blogs`: newest created first.
pub async fn admin_list_blogs(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<Page<Blog>>, AppError> {
    let (filter, page, limit) = query.into_filter(false);
    Ok(Json(state.blogs.list(&filter, page, limit).await?))
}

pub async fn create_blog(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<BlogInput>,
) -> Result<(StatusCode, Json<Blog>), AppError> {
    let blog = state.blogs.create(input).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn admin_get_blog(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Blog>, AppError> {
    let id = parse_id(&id, "blog")?;
    Ok(Json(state.blogs.get_by_id(id).await?))
}

pub async fn update_blog(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<BlogInput>,
) -> Result<Json<Blog>, AppError> {
    let id = parse_id(&id, "blog")?;
    Ok(Json(state.blogs.update(id, input).await?))
}

pub async fn delete_blog(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    let id = parse_id(&id, "blog")?;
    state.blogs.delete(id).await?;
    Ok(Json(Deleted::new("Blog deleted successfully")))
}
