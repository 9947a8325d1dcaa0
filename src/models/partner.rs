use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::services::store::not_blank;

/// An entry in the "our work partners" directory.
#[derive(Serialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub name: Option<String>,

    /// Descriptive caption shown under the logo.
    pub title_name: String,
    pub slug: String,

    /// Logo URL.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/our-work-partner`. `name` is optional.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPartner {
    pub name: Option<String>,
    #[validate(
        required(message = "titleName"),
        custom(function = "not_blank", message = "titleName")
    )]
    pub title_name: Option<String>,
    pub slug: Option<String>,
    #[validate(required, custom(function = "not_blank"))]
    pub image: Option<String>,
}

/// Body of the partner update endpoints. A blank `name` clears it.
#[derive(Deserialize, Validate, Default, Debug)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartnerPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    #[validate(custom(function = "not_blank", message = "titleName"))]
    pub title_name: Option<String>,
    pub slug: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub image: Option<String>,
}
