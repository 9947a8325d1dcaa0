//! Request extractors with JSON error rejections.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::AppError;

/// A `Json<T>` wrapper whose rejections (malformed JSON, unknown fields,
/// wrong types) become 400 responses in the usual `{ error, status }` shape.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Parse a path or body id, rejecting malformed ones as `Invalid <resource> ID`.
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(format!("Invalid {resource} ID")))
}

/// Parse a path id, rejecting a request whose body also names a different
/// document. A blank or absent body id is ignored.
pub fn path_id(raw: &str, body_id: Option<&str>, resource: &str) -> Result<Uuid, AppError> {
    let id = parse_id(raw, resource)?;
    match body_id.map(str::trim).filter(|b| !b.is_empty()) {
        Some(body) if parse_id(body, resource)? != id => Err(AppError::bad_request(format!(
            "Body {resource} ID does not match the URL"
        ))),
        _ => Ok(id),
    }
}
