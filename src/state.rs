use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    auth::{AdminCredentials, AuthKeys},
    services::{
        blog_service::BlogService, firm_service::FirmService, media_service::MediaService,
        partner_service::PartnerService, upload_service::UploadService,
    },
};

/// Everything handlers need, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub blogs: BlogService,
    pub media: MediaService,
    pub firms: FirmService,
    pub partners: PartnerService,
    pub uploads: UploadService,
    pub auth: AuthKeys,
    pub admin: AdminCredentials,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the resource services onto one pool and one upload directory.
    pub fn new(
        db: Arc<SqlitePool>,
        uploads: UploadService,
        auth: AuthKeys,
        admin: AdminCredentials,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            blogs: BlogService::new(db.clone(), uploads.clone()),
            media: MediaService::new(db.clone(), uploads.clone()),
            firms: FirmService::new(db.clone(), uploads.clone()),
            partners: PartnerService::new(db.clone(), uploads.clone()),
            db,
            uploads,
            auth,
            admin,
            max_upload_bytes,
        }
    }
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
