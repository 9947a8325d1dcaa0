use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{auth::ADMIN_ROLE, errors::AppError, extractors::AppJson, state::AppState};

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !state.admin.matches(&payload.username, &payload.password) {
        tracing::warn!(username = %payload.username, "failed admin login");
        return Err(AppError::unauthorized());
    }

    let issued = state.auth.sign(state.admin.username(), ADMIN_ROLE)?;
    tracing::info!(username = %payload.username, "admin logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        role: ADMIN_ROLE,
        expires_at: issued.expires_at,
    }))
}
