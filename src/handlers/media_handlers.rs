//! Media gallery endpoints.

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
        media::{Media, MediaFilter, MediaPatch, NewMedia},
    },
    services::store::non_blank,
    state::AppState,
    utils::pagination::{DEFAULT_PAGE_SIZE, resolve_page},
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MediaListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub featured: Option<String>,
}

impl MediaListQuery {
    fn into_filter(self) -> (MediaFilter, u64, u64) {
        let (page, limit) =
            resolve_page(self.page.as_deref(), self.limit.as_deref(), DEFAULT_PAGE_SIZE);
        let filter = MediaFilter {
            // "all" is what the gallery's category picker sends for no filter.
            category: non_blank(self.category).filter(|c| !c.eq_ignore_ascii_case("all")),
            tag: non_blank(self.tag),
            search: non_blank(self.search),
            featured_only: self.featured.as_deref() == Some("true"),
        };
        (filter, page, limit)
    }
}

/// `GET /api/media`
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<Page<Media>>, AppError> {
    let (filter, page, limit) = query.into_filter();
    Ok(Json(state.media.list(&filter, page, limit).await?))
}

/// `GET /api/media/{slug}`: counts as a view.
pub async fn view_media(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Media>, AppError> {
    Ok(Json(state.media.view_by_slug(&slug).await?))
}

pub async fn admin_list_media(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<Page<Media>>, AppError> {
    let (filter, page, limit) = query.into_filter();
    Ok(Json(state.media.list(&filter, page, limit).await?))
}

pub async fn create_media(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewMedia>,
) -> Result<(StatusCode, Json<Media>), AppError> {
    let media = state.media.create(input).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

/// `GET /api/admin/media/{id}`: counts as a view like the public read.
pub async fn admin_get_media(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Media>, AppError> {
    let id = parse_id(&id, "media")?;
    Ok(Json(state.media.view_by_id(id).await?))
}

pub async fn update_media(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<MediaPatch>,
) -> Result<Json<Media>, AppError> {
    let id = parse_id(&id, "media")?;
    Ok(Json(state.media.update(id, patch).await?))
}

pub async fn delete_media(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    let id = parse_id(&id, "media")?;
    state.media.delete(id).await?;
    Ok(Json(Deleted::new("Media deleted successfully")))
}
