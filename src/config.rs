use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, str::FromStr};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Centralized application configuration.
/// CLI flags win over `SITE_CMS_*` environment variables, which win over defaults.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub public_upload_path: String,
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub token_ttl_hours: i64,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Content API for a marketing site")]
pub struct Args {
    /// Host to bind to (overrides SITE_CMS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SITE_CMS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory uploaded images are written to (overrides SITE_CMS_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Database URL (overrides SITE_CMS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let cfg = Self {
            host: args.host.unwrap_or(env_or("SITE_CMS_HOST", "0.0.0.0".into())?),
            port: match args.port {
                Some(port) => port,
                None => env_or("SITE_CMS_PORT", 3000)?,
            },
            upload_dir: args
                .upload_dir
                .unwrap_or(env_or("SITE_CMS_UPLOAD_DIR", "./data/uploads".into())?),
            public_upload_path: env_or("SITE_CMS_PUBLIC_UPLOAD_PATH", "/uploads".into())?,
            database_url: args.database_url.unwrap_or(env_or(
                "SITE_CMS_DATABASE_URL",
                "sqlite://./data/site_cms.db".into(),
            )?),
            jwt_secret: env_opt("SITE_CMS_JWT_SECRET")?,
            admin_username: env_or("SITE_CMS_ADMIN_USERNAME", "admin".into())?,
            admin_password: env_opt("SITE_CMS_ADMIN_PASSWORD")?,
            token_ttl_hours: env_or("SITE_CMS_TOKEN_TTL_HOURS", 24)?,
            max_upload_bytes: env_or("SITE_CMS_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        };
        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The token secret and admin password, which serving requires.
    pub fn secrets(&self) -> Result<(&str, &str)> {
        let Some(secret) = self.jwt_secret.as_deref().filter(|s| !s.is_empty()) else {
            bail!("SITE_CMS_JWT_SECRET must be set");
        };
        let Some(password) = self.admin_password.as_deref().filter(|s| !s.is_empty()) else {
            bail!("SITE_CMS_ADMIN_PASSWORD must be set");
        };
        Ok((secret, password))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("public_upload_path", &self.public_upload_path)
            .field("database_url", &self.database_url)
            .field("admin_username", &self.admin_username)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

fn env_opt(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {key}")),
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_opt(key)? {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {key} value `{value}`")),
        None => Ok(default),
    }
}
