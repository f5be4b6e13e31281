#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use wallhub_api::auth::session::{SessionConfig, SessionStore, SESSION_COOKIE};
use wallhub_api::config::{MediaConfig, ServerConfig};
use wallhub_api::router::build_app_router;
use wallhub_api::state::AppState;
use wallhub_core::media::{MediaTransformer, TransformError};
use wallhub_core::uploads::{snapshot_file_name, trimmed_file_name, TRIMMED_PREFIX};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";

/// Build a test `ServerConfig` writing uploads to `upload_dir`.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        public_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../public"),
        max_upload_bytes: 16 * 1024 * 1024,
        media: MediaConfig {
            max_duration_secs: 15.0,
            snapshot_offset_secs: 2.0,
            thumbnail_width: 720,
            tool_timeout: Duration::from_secs(5),
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            ttl: Duration::from_secs(3600),
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
        },
    }
}

/// Stands in for ffmpeg: copies the source as the "trimmed" file and writes
/// a placeholder snapshot. Sources whose name contains `corrupt` fail.
#[derive(Default)]
pub struct FakeTransformer {
    pub trims: AtomicUsize,
    pub snapshots: AtomicUsize,
}

impl FakeTransformer {
    pub fn trim_count(&self) -> usize {
        self.trims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTransformer for FakeTransformer {
    async fn trim(&self, source: &Path, _max_duration_secs: f64) -> Result<PathBuf, TransformError> {
        let name = source.file_name().unwrap().to_string_lossy().to_string();
        if name.contains("corrupt") {
            return Err(TransformError::NotVideo(source.to_string_lossy().to_string()));
        }
        self.trims.fetch_add(1, Ordering::SeqCst);
        let output = source.with_file_name(trimmed_file_name(&name));
        tokio::fs::copy(source, &output).await.unwrap();
        Ok(output)
    }

    async fn snapshot(
        &self,
        video: &Path,
        _offset_secs: f64,
        _width: u32,
    ) -> Result<PathBuf, TransformError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        let name = video.file_name().unwrap().to_string_lossy().to_string();
        let stored = name.strip_prefix(TRIMMED_PREFIX).unwrap_or(&name);
        let output = video.with_file_name(snapshot_file_name(stored));
        tokio::fs::write(&output, b"jpeg").await.unwrap();
        Ok(output)
    }
}

/// A router plus the handles tests need to inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub sessions: Arc<SessionStore>,
    pub transformer: Arc<FakeTransformer>,
    pub upload_dir: TempDir,
}

impl TestApp {
    /// A `Cookie` header value for a fresh admin session.
    pub async fn session_cookie(&self) -> String {
        let value = self.sessions.create(ADMIN_USERNAME).await;
        format!("{SESSION_COOKIE}={value}")
    }

    /// Names of every file currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Build the full application router, using the given database pool, a
/// temporary upload directory, and [`FakeTransformer`].
pub fn build_test_app(pool: PgPool) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = test_config(upload_dir.path());
    let sessions = Arc::new(SessionStore::new(&config.session.secret, config.session.ttl));
    let transformer = Arc::new(FakeTransformer::default());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        sessions: Arc::clone(&sessions),
        transformer: transformer.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        sessions,
        transformer,
        upload_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: &Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_multipart(
    app: &Router,
    uri: &str,
    form: MultipartBody,
    cookie: Option<&str>,
) -> Response<Body> {
    let (content_type, body) = form.finish();
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body)).unwrap()).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// Multipart builder
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "wallhub-test-boundary";

/// Minimal `multipart/form-data` encoder.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}
