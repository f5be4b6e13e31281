//! Server-side sessions for the admin login gate.
//!
//! A session is an opaque random token kept in [`SessionStore`]. The cookie
//! carries `<token>.<hex HMAC-SHA256(token)>` keyed with `SESSION_SECRET`, so
//! a forged or truncated cookie is rejected before the store is consulted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wallhub_core::types::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "wallhub_session";

/// Default session lifetime in hours.
const DEFAULT_TTL_HOURS: u64 = 24;

/// Session gate configuration.
#[derive(Clone)]
pub struct SessionConfig {
    /// Key for signing session cookies.
    pub secret: String,
    /// Fixed lifetime of a session from login.
    pub ttl: Duration,
    /// The single admin account's username.
    pub admin_username: String,
    /// The single admin account's password, compared verbatim.
    pub admin_password: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("ttl", &self.ttl)
            .field("admin_username", &self.admin_username)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var             | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SESSION_SECRET`    | **yes**  | --      |
    /// | `SESSION_TTL_HOURS` | no       | `24`    |
    /// | `ADMIN_USERNAME`    | **yes**  | --      |
    /// | `ADMIN_PASSWORD`    | **yes**  | --      |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or empty.
    pub fn from_env() -> Self {
        let secret = required_env("SESSION_SECRET");

        let ttl_hours: u64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_TTL_HOURS.to_string())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid u64");

        Self {
            secret,
            ttl: Duration::from_secs(ttl_hours * 3600),
            admin_username: required_env("ADMIN_USERNAME"),
            admin_password: required_env("ADMIN_PASSWORD"),
        }
    }

    /// Exact comparison against the configured admin credentials.
    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }
}

fn required_env(key: &str) -> String {
    let value = std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set in the environment"));
    assert!(!value.is_empty(), "{key} must not be empty");
    value
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// An authenticated admin session.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// In-process session store.
///
/// Thread-safe via interior `RwLock`; shared as `Arc<SessionStore>` in the
/// application state.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    mac: HmacSha256,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store signing cookies with `secret`.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        Self {
            sessions: RwLock::new(HashMap::new()),
            mac,
            ttl,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `username` and return the signed cookie value.
    pub async fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = chrono::Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let session = Session {
            username: username.to_string(),
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(Timestamp::MAX_UTC),
        };
        self.sessions.write().await.insert(token.clone(), session);
        self.sign(&token)
    }

    /// Resolve a cookie value to its live session.
    ///
    /// Bad signatures, unknown tokens, and expired sessions all yield `None`;
    /// an expired session is dropped on the way out.
    pub async fn validate(&self, cookie_value: &str) -> Option<Session> {
        self.validate_at(cookie_value, chrono::Utc::now()).await
    }

    async fn validate_at(&self, cookie_value: &str, now: Timestamp) -> Option<Session> {
        let token = self.verify(cookie_value)?;

        let session = self.sessions.read().await.get(token).cloned()?;
        if session.expires_at <= now {
            self.sessions.write().await.remove(token);
            return None;
        }
        Some(session)
    }

    /// End the session behind `cookie_value`. Returns `true` if one existed.
    pub async fn revoke(&self, cookie_value: &str) -> bool {
        match self.verify(cookie_value) {
            Some(token) => self.sessions.write().await.remove(token).is_some(),
            None => false,
        }
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(chrono::Utc::now()).await
    }

    async fn purge_expired_at(&self, now: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    /// Number of sessions currently held (live or not yet purged).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        format!("{token}.{:x}", mac.finalize().into_bytes())
    }

    /// Check the signature and return the bare token.
    fn verify<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (token, signature) = cookie_value.rsplit_once('.')?;
        let signature = decode_hex(signature)?;
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(token)
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|b| u8::from_str_radix(b, 16).ok()))
        .collect()
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

/// Find the value of cookie `name` in the request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(value: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

/// `Set-Cookie` value clearing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

/// Periodically purge expired sessions until `cancel` fires.
pub fn spawn_session_sweeper(
    store: Arc<SessionStore>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let removed = store.purge_expired().await;
                    if removed > 0 {
                        tracing::debug!(removed, "Purged expired sessions");
                    }
                }
            }
        }
    })
}
