//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: parse the request, call the matching service, and
//! shape the JSON response. Admin handlers take an [`AdminUser`] first so an
//! unauthenticated request is rejected before its body is read.
//!
//! [`AdminUser`]: crate::auth::AdminUser

pub mod auth_handlers;
pub mod blog_handlers;
pub mod firm_handlers;
pub mod health_handlers;
pub mod media_handlers;
pub mod partner_handlers;
pub mod upload_handlers;

use serde::Serialize;

/// Body returned by every delete endpoint.
#[derive(Serialize, Debug)]
pub struct Deleted {
    pub success: bool,
    pub message: String,
}

impl Deleted {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
