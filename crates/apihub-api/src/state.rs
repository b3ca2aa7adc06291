//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use apihub_db::Database;
use rusqlite::Connection;
use tracing::error;

use crate::auth::{Passwords, TokenKeys};
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
    pub passwords: Passwords,
    /// Server start time for uptime calculation.
    pub started_at: Instant,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenKeys, passwords: Passwords) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            passwords,
            started_at: Instant::now(),
        })
    }

    /// Runs `f` in one database transaction on a blocking thread.
    pub async fn transaction<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.db.transaction(f))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
            })?
    }

    /// Runs CPU-heavy work (password hashing) off the async runtime.
    pub async fn blocking<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
            })?
    }
}
