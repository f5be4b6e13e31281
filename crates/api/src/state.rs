use std::sync::Arc;

use wallhub_core::media::MediaTransformer;

use crate::auth::session::SessionStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: wallhub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Admin sessions (login gate).
    pub sessions: Arc<SessionStore>,
    /// Trim/snapshot backend for live uploads.
    pub transformer: Arc<dyn MediaTransformer>,
}
