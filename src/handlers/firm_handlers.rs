//! "Our firms" endpoints.
//!
//! The collection routes accept a single-document selector as well: the
//! public listing takes `?slug=`, the admin listing `?id=`, and the admin
//! `PUT`/`DELETE` on the collection read the id from the body.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    auth::AdminUser,
    errors::AppError,
    extractors::{AppJson, parse_id, path_id},
    handlers::Deleted,
    models::{
        IdBody,
        firm::{Firm, FirmPatch, NewFirm},
    },
    services::store::non_blank,
    state::AppState,
    utils::pagination::{DEFAULT_PAGE_SIZE, resolve_page},
};

const RESOURCE: &str = "firm";
const ID_REQUIRED: &str = "Firm ID is required";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FirmListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub slug: Option<String>,
    pub id: Option<String>,
}

impl FirmListQuery {
    async fn list(self, state: &AppState) -> Result<Response, AppError> {
        let (page, limit) =
            resolve_page(self.page.as_deref(), self.limit.as_deref(), DEFAULT_PAGE_SIZE);
        let search = non_blank(self.search);
        let page = state.firms.list(search.as_deref(), page, limit).await?;
        Ok(Json(page).into_response())
    }
}

/// `GET /api/our-firms[?slug=]`
pub async fn list_firms(
    State(state): State<AppState>,
    Query(query): Query<FirmListQuery>,
) -> Result<Response, AppError> {
    match non_blank(query.slug.clone()) {
        Some(slug) => Ok(Json(state.firms.get_by_slug(&slug).await?).into_response()),
        None => query.list(&state).await,
    }
}

/// `GET /api/our-firms/{slug}`
pub async fn get_firm(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Firm>, AppError> {
    Ok(Json(state.firms.get_by_slug(&slug).await?))
}

/// `GET /api/admin/our-firms[?id=]`
pub async fn admin_list_firms(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<FirmListQuery>,
) -> Result<Response, AppError> {
    match non_blank(query.id.clone()) {
        Some(id) => {
            let id = parse_id(&id, RESOURCE)?;
            Ok(Json(state.firms.get_by_id(id).await?).into_response())
        }
        None => query.list(&state).await,
    }
}

pub async fn create_firm(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewFirm>,
) -> Result<(StatusCode, Json<Firm>), AppError> {
    let firm = state.firms.create(input).await?;
    Ok((StatusCode::CREATED, Json(firm)))
}

/// `PUT /api/admin/our-firms` with the id in the body.
pub async fn update_firm_by_body(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(patch): AppJson<FirmPatch>,
) -> Result<Json<Firm>, AppError> {
    let id = body_id(patch.id.clone())?;
    Ok(Json(state.firms.update(id, patch).await?))
}

/// `DELETE /api/admin/our-firms` with the id in the body.
pub async fn delete_firm_by_body(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<IdBody>,
) -> Result<Json<Deleted>, AppError> {
    let id = body_id(body.id)?;
    state.firms.delete(id).await?;
    Ok(Json(Deleted::new("Firm deleted successfully")))
}

pub async fn admin_get_firm(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Firm>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    Ok(Json(state.firms.get_by_id(id).await?))
}

pub async fn update_firm(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<FirmPatch>,
) -> Result<Json<Firm>, AppError> {
    let id = path_id(&id, patch.id.as_deref(), RESOURCE)?;
    Ok(Json(state.firms.update(id, patch).await?))
}

pub async fn delete_firm(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    state.firms.delete(id).await?;
    Ok(Json(Deleted::new("Firm deleted successfully")))
}

fn body_id(raw: Option<String>) -> Result<uuid::Uuid, AppError> {
    let raw = non_blank(raw).ok_or_else(|| AppError::bad_request(ID_REQUIRED))?;
    parse_id(&raw, RESOURCE)
}
