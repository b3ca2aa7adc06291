//! Process configuration, read from `APIHUB_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::Algorithm;
use tracing::warn;

/// Secrets that ship in sample `.env` files. Refused outright.
const PLACEHOLDER_SECRETS: &[&str] = &["changethis", "change-me", "dev-secret-change-me", "secret"];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl: chrono::Duration,
    pub first_superuser: String,
    /// Bootstrap is skipped when unset.
    pub first_superuser_password: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port: u16 = var("APIHUB_PORT", "3000")
            .parse()
            .context("APIHUB_PORT must be a port number")?;

        let jwt_secret = match get("APIHUB_JWT_SECRET") {
            Some(secret) if PLACEHOLDER_SECRETS.contains(&secret.as_str()) => {
                bail!("APIHUB_JWT_SECRET is a placeholder value, set a real secret")
            }
            Some(secret) if secret.is_empty() => bail!("APIHUB_JWT_SECRET must not be empty"),
            Some(secret) => secret,
            None => {
                warn!("APIHUB_JWT_SECRET not set, using a random secret; tokens will not survive a restart");
                STANDARD.encode(rand::random::<[u8; 32]>())
            }
        };

        let jwt_algorithm = parse_algorithm(&var("APIHUB_JWT_ALGORITHM", "HS256"))?;

        let minutes: i64 = var("APIHUB_ACCESS_TOKEN_EXPIRE_MINUTES", "60")
            .parse()
            .context("APIHUB_ACCESS_TOKEN_EXPIRE_MINUTES must be an integer")?;
        if minutes <= 0 {
            bail!("APIHUB_ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }

        Ok(Self {
            host: var("APIHUB_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var("APIHUB_DB_PATH", "apihub.db")),
            jwt_secret,
            jwt_algorithm,
            token_ttl: chrono::Duration::minutes(minutes),
            first_superuser: var("APIHUB_FIRST_SUPERUSER", "admin@example.com"),
            first_superuser_password: get("APIHUB_FIRST_SUPERUSER_PASSWORD").filter(|p| !p.is_empty()),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Only the shared-secret HMAC family fits a single configured secret.
fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    match name.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => bail!("unsupported APIHUB_JWT_ALGORITHM '{}', expected HS256, HS384 or HS512", other),
    }
}
