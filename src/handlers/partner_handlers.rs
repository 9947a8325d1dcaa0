//! "Our work partner" endpoints. Same shape as the firm endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    errors::AppError,
    extractors::{AppJson, parse_id, path_id},
    handlers::Deleted,
    models::{
        IdBody,
        partner::{NewPartner, Partner, PartnerPatch},
    },
    services::store::non_blank,
    state::AppState,
    utils::pagination::{DEFAULT_PAGE_SIZE, resolve_page},
};

const RESOURCE: &str = "partner";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PartnerListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub slug: Option<String>,
    pub id: Option<String>,
}

async fn list_page(state: &AppState, query: PartnerListQuery) -> Result<Response, AppError> {
    let (page, limit) =
        resolve_page(query.page.as_deref(), query.limit.as_deref(), DEFAULT_PAGE_SIZE);
    let search = non_blank(query.search);
    let page = state.partners.list(search.as_deref(), page, limit).await?;
    Ok(Json(page).into_response())
}

/// `GET /api/our-work-partner[?slug=]`
pub async fn list_partners(
    State(state): State<AppState>,
    Query(query): Query<PartnerListQuery>,
) -> Result<Response, AppError> {
    if let Some(slug) = non_blank(query.slug.clone()) {
        return Ok(Json(state.partners.get_by_slug(&slug).await?).into_response());
    }
    list_page(&state, query).await
}

pub async fn get_partner(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Partner>, AppError> {
    Ok(Json(state.partners.get_by_slug(&slug).await?))
}

/// `GET /api/admin/our-work-partner[?id=]`
pub async fn admin_list_partners(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<PartnerListQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = non_blank(query.id.clone()) {
        let id = parse_id(&id, RESOURCE)?;
        return Ok(Json(state.partners.get_by_id(id).await?).into_response());
    }
    list_page(&state, query).await
}

pub async fn create_partner(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewPartner>,
) -> Result<(StatusCode, Json<Partner>), AppError> {
    let partner = state.partners.create(input).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update_partner_by_body(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(patch): AppJson<PartnerPatch>,
) -> Result<Json<Partner>, AppError> {
    let id = id_from_body(patch.id.clone())?;
    Ok(Json(state.partners.update(id, patch).await?))
}

pub async fn delete_partner_by_body(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<IdBody>,
) -> Result<Json<Deleted>, AppError> {
    let id = id_from_body(body.id)?;
    state.partners.delete(id).await?;
    Ok(Json(Deleted::new("Partner deleted successfully")))
}

pub async fn admin_get_partner(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Partner>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    Ok(Json(state.partners.get_by_id(id).await?))
}

pub async fn update_partner(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<PartnerPatch>,
) -> Result<Json<Partner>, AppError> {
    let id = path_id(&id, patch.id.as_deref(), RESOURCE)?;
    Ok(Json(state.partners.update(id, patch).await?))
}

pub async fn delete_partner(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    let id = parse_id(&id, RESOURCE)?;
    state.partners.delete(id).await?;
    Ok(Json(Deleted::new("Partner deleted successfully")))
}

fn id_from_body(raw: Option<String>) -> Result<Uuid, AppError> {
    match non_blank(raw) {
        Some(raw) => parse_id(&raw, RESOURCE),
        None => Err(AppError::bad_request("Partner ID is required")),
    }
}
