//! Test helpers: build the real router over an in-memory database and a
//! temporary upload directory.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Duration;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

use site_cms::{
    auth::{AdminCredentials, AuthKeys},
    db, routes,
    services::upload_service::UploadService,
    state::AppState,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;
pub const JWT_SECRET: &[u8] = b"integration-secret";

/// Test application: server, admin token, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub token: String,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn upload_path(&self, file_name: &str) -> std::path::PathBuf {
        self.upload_dir.path().join(file_name)
    }

    /// POST `body` to an admin collection and return the created document.
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self
            .server
            .post(path)
            .authorization_bearer(&self.token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json()
    }
}

pub async fn spawn_app() -> TestApp {
    let pool = db::connect("sqlite::memory:").await.expect("connect");
    db::migrate(&pool).await.expect("migrate");
    let upload_dir = tempfile::tempdir().expect("tempdir");

    let state = AppState::new(
        Arc::new(pool),
        UploadService::new(upload_dir.path(), "/uploads"),
        AuthKeys::new(JWT_SECRET, Duration::hours(1)),
        AdminCredentials::new(ADMIN_USERNAME, ADMIN_PASSWORD),
        MAX_UPLOAD_BYTES,
    );
    let server = TestServer::new(routes::app(state)).expect("test server");

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(login.status_code(), 200);
    let token = login.json::<Value>()["token"]
        .as_str()
        .expect("token in login response")
        .to_string();

    TestApp {
        server,
        token,
        upload_dir,
    }
}

pub fn blog_body(title: &str, slug: &str) -> Value {
    json!({
        "title": title,
        "slug": slug,
        "excerpt": "A short summary",
        "content": "<p>Body</p>",
        "featured_image": "https://cdn.example.com/cover.jpg",
        "author": "Editor",
    })
}
