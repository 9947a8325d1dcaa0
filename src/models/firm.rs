use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::services::store::not_blank;

/// An entry in the "our firms" directory.
#[derive(Serialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Firm {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,

    /// Logo URL.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/our-firms`.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct NewFirm {
    #[validate(required, custom(function = "not_blank"))]
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub image: Option<String>,
}

/// Body of the firm update endpoints. `id` is only read by the endpoints
/// that take it in the body; elsewhere it must match the path id.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct FirmPatch {
    pub id: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[validate(custom(function = "not_blank"))]
    pub image: Option<String>,
}
