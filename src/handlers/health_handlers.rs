//! Health & readiness handlers.
//!
//! - GET /healthz  -> liveness, no I/O
//! - GET /readyz   -> checks SQLite and that the upload directory is writable

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::state::AppState;

const PROBE_BYTES: &[u8] = b"readyz";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    checks: Checks,
}

#[derive(Serialize)]
struct Checks {
    sqlite: CheckStatus,
    uploads: CheckStatus,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Result<(), String>> for CheckStatus {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => CheckStatus { ok: true, error: None },
            Err(error) => CheckStatus {
                ok: false,
                error: Some(error),
            },
        }
    }
}

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /readyz`: 200 when every check passes, 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let checks = Checks {
        sqlite: probe_sqlite(&state).await.into(),
        uploads: probe_dir(state.uploads.base_path()).await.into(),
    };

    let ready = checks.sqlite.ok && checks.uploads.ok;
    if !ready {
        tracing::warn!(
            sqlite = ?checks.sqlite.error,
            uploads = ?checks.uploads.error,
            "readiness check failed"
        );
    }

    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };
    (status, Json(ReadyResponse { status: label, checks }))
}

async fn probe_sqlite(state: &AppState) -> Result<(), String> {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.db)
        .await
    {
        Ok(1) => Ok(()),
        Ok(other) => Err(format!("unexpected result: {other}")),
        Err(err) => Err(format!("error: {err}")),
    }
}

/// Write, read back and delete a scratch file in `dir`.
async fn probe_dir(dir: &Path) -> Result<(), String> {
    let path = dir.join(format!(".readyz-{}", Uuid::new_v4()));
    fs::write(&path, PROBE_BYTES)
        .await
        .map_err(|e| format!("could not write probe file: {e}"))?;

    let read = fs::read(&path).await;
    let _ = fs::remove_file(&path).await;
    match read {
        Ok(bytes) if bytes == PROBE_BYTES => Ok(()),
        Ok(_) => Err("probe file content mismatch".into()),
        Err(e) => Err(format!("could not read probe file: {e}")),
    }
}
