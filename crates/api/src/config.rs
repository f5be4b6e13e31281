use std::path::PathBuf;
use std::time::Duration;

use wallhub_core::media::{
    TransformSettings, DEFAULT_MAX_DURATION_SECS, DEFAULT_SNAPSHOT_OFFSET_SECS,
    DEFAULT_THUMBNAIL_WIDTH,
};

use crate::auth::session::SessionConfig;

/// Default upload body limit (512 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the session secret and admin credentials have defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`). Covers ffmpeg runs
    /// for live uploads.
    pub request_timeout_secs: u64,
    /// Directory uploaded and derived media are written to and served from.
    pub upload_dir: PathBuf,
    /// Directory holding the dashboard and login pages.
    pub public_dir: PathBuf,
    /// Maximum multipart body size for `POST /api/wallpapers`.
    pub max_upload_bytes: usize,
    /// Live wallpaper derivation settings.
    pub media: MediaConfig,
    /// Session gate settings (secret, lifetime, admin credentials).
    pub session: SessionConfig,
}

/// Live wallpaper derivation settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Longest duration kept from a live upload (default: `15`).
    pub max_duration_secs: f64,
    /// Offset of the snapshot frame in the trimmed video (default: `2`).
    pub snapshot_offset_secs: f64,
    /// Snapshot width in pixels (default: `720`).
    pub thumbnail_width: u32,
    /// Wall-clock limit per ffmpeg/ffprobe run (default: `120`).
    pub tool_timeout: Duration,
}

impl MediaConfig {
    /// Settings handed to the transform adapter.
    pub fn transform_settings(&self) -> TransformSettings {
        TransformSettings {
            max_duration_secs: self.max_duration_secs,
            snapshot_offset_secs: self.snapshot_offset_secs,
            thumbnail_width: self.thumbnail_width,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `3000`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `600`                    |
    /// | `UPLOAD_DIR`             | `uploads`                |
    /// | `PUBLIC_DIR`             | `public`                 |
    /// | `MAX_UPLOAD_BYTES`       | `536870912`              |
    /// | `LIVE_MAX_DURATION_SECS` | `15`                     |
    /// | `SNAPSHOT_OFFSET_SECS`   | `2`                      |
    /// | `THUMBNAIL_WIDTH`        | `720`                    |
    /// | `FFMPEG_TIMEOUT_SECS`    | `120`                    |
    ///
    /// Session variables are documented on [`SessionConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 600);

        let upload_dir = PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));
        let public_dir = PathBuf::from(std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into()));

        let max_upload_bytes: usize = env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        let media = MediaConfig {
            max_duration_secs: env_or("LIVE_MAX_DURATION_SECS", DEFAULT_MAX_DURATION_SECS),
            snapshot_offset_secs: env_or("SNAPSHOT_OFFSET_SECS", DEFAULT_SNAPSHOT_OFFSET_SECS),
            thumbnail_width: env_or("THUMBNAIL_WIDTH", DEFAULT_THUMBNAIL_WIDTH),
            tool_timeout: Duration::from_secs(env_or("FFMPEG_TIMEOUT_SECS", 120)),
        };
        assert!(
            media.max_duration_secs > 0.0,
            "LIVE_MAX_DURATION_SECS must be positive"
        );

        let session = SessionConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            public_dir,
            max_upload_bytes,
            media,
            session,
        }
    }
}

/// Read and parse `key`, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse; misconfiguration
/// should stop the server at startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
