use anyhow::{Context, Result};
use chrono::Duration;
use std::{io::ErrorKind, sync::Arc};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

use site_cms::{
    auth::{AdminCredentials, AuthKeys},
    config::AppConfig,
    db, routes,
    services::upload_service::UploadService,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;
    tracing::info!("Starting site-cms with config: {:?}", cfg);

    // --- Database ---
    let pool = db::connect(&cfg.database_url).await?;
    db::migrate(&pool).await?;
    if migrate {
        tracing::info!("Database migration complete.");
        pool.close().await;
        return Ok(());
    }

    // --- Upload directory ---
    fs::create_dir_all(&cfg.upload_dir)
        .await
        .with_context(|| format!("creating upload directory {}", cfg.upload_dir))?;

    // --- Services ---
    let (secret, password) = cfg.secrets()?;
    let db = Arc::new(pool);
    let state = AppState::new(
        db.clone(),
        UploadService::new(&cfg.upload_dir, &cfg.public_upload_path),
        AuthKeys::new(secret.as_bytes(), Duration::hours(cfg.token_ttl_hours)),
        AdminCredentials::new(&cfg.admin_username, password),
        cfg.max_upload_bytes,
    );
    let app = routes::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing database pool");
    db.close().await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
