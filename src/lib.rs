//! Content API behind a marketing site: blog posts, a media gallery, and
//! the "our firms" / "our work partner" directories, plus image uploads.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
