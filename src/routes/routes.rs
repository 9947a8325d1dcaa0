//! Router for the whole site API.
//!
//! ## Structure
//! - **Public reads**
//!   - `GET /api/blogs`, `GET /api/blogs/{slug}`
//!   - `GET /api/media`, `GET /api/media/{slug}` (counts a view)
//!   - `GET /api/our-firms`, `GET /api/our-firms/{slug}`
//!   - `GET /api/our-work-partner`, `GET /api/our-work-partner/{slug}`
//!   - `GET <public upload path>/{fileName}`
//!
//! - **Admin** (bearer token required)
//!   - `/api/admin/{blogs,media}` and `/{id}`: list/create, get/update/delete
//!   - `/api/admin/{our-firms,our-work-partner}`: additionally accept
//!     `PUT`/`DELETE` on the collection with the id in the body
//!   - `POST|DELETE /api/upload-image`
//!
//! - `POST /api/auth/login`, `GET /healthz`, `GET /readyz`

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{
        auth_handlers::login,
        blog_handlers::{
            admin_get_blog, admin_list_blogs, create_blog, delete_blog, get_blog, list_blogs,
            update_blog,
        },
        firm_handlers::{
            admin_get_firm, admin_list_firms, create_firm, delete_firm, delete_firm_by_body,
            get_firm, list_firms, update_firm, update_firm_by_body,
        },
        health_handlers::{healthz, readyz},
        media_handlers::{
            admin_get_media, admin_list_media, create_media, delete_media, list_media,
            update_media, view_media,
        },
        partner_handlers::{
            admin_get_partner, admin_list_partners, create_partner, delete_partner,
            delete_partner_by_body, get_partner, list_partners, update_partner,
            update_partner_by_body,
        },
        upload_handlers::{delete_image, serve_upload, upload_image},
    },
    state::AppState,
};

/// Build the application router with its state attached.
pub fn app(state: AppState) -> Router {
    let uploads_route = format!("{}/{{file_name}}", state.uploads.public_path());

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/auth/login", post(login))
        .merge(public_routes())
        .route(&uploads_route, get(serve_upload))
        .merge(admin_routes())
        .route(
            "/api/upload-image",
            post(upload_image)
                .delete(delete_image)
                .layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", get(list_blogs))
        .route("/api/blogs/{slug}", get(get_blog))
        .route("/api/media", get(list_media))
        .route("/api/media/{slug}", get(view_media))
        .route("/api/our-firms", get(list_firms))
        .route("/api/our-firms/{slug}", get(get_firm))
        .route("/api/our-work-partner", get(list_partners))
        .route("/api/our-work-partner/{slug}", get(get_partner))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/blogs", get(admin_list_blogs).post(create_blog))
        .route(
            "/api/admin/blogs/{id}",
            get(admin_get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/api/admin/media", get(admin_list_media).post(create_media))
        .route(
            "/api/admin/media/{id}",
            get(admin_get_media).put(update_media).delete(delete_media),
        )
        .route(
            "/api/admin/our-firms",
            get(admin_list_firms)
                .post(create_firm)
                .put(update_firm_by_body)
                .delete(delete_firm_by_body),
        )
        .route(
            "/api/admin/our-firms/{id}",
            get(admin_get_firm).put(update_firm).delete(delete_firm),
        )
        .route(
            "/api/admin/our-work-partner",
            get(admin_list_partners)
                .post(create_partner)
                .put(update_partner_by_body)
                .delete(delete_partner_by_body),
        )
        .route(
            "/api/admin/our-work-partner/{id}",
            get(admin_get_partner)
                .put(update_partner)
                .delete(delete_partner),
        )
}
