//! HTML pages and the login form endpoints.

use axum::routing::{get, get_service};
use axum::Router;
use tower_http::services::ServeFile;

use crate::config::ServerConfig;
use crate::handlers::auth;
use crate::state::AppState;

/// Dashboard page file, relative to the public directory.
pub const INDEX_PAGE: &str = "index.html";

/// Login page file, relative to the public directory.
pub const LOGIN_PAGE: &str = "login.html";

/// Routes reachable without a session.
///
/// ```text
/// GET    /login     -> login.html
/// POST   /login     -> auth::login
/// ```
pub fn public_router(config: &ServerConfig) -> Router<AppState> {
    Router::new().route(
        "/login",
        get_service(ServeFile::new(config.public_dir.join(LOGIN_PAGE))).post(auth::login),
    )
}

/// Pages that require a session.
///
/// ```text
/// GET    /                    -> index.html
/// GET    /public/index.html   -> index.html (shadows the public file server)
/// GET    /logout              -> auth::logout
/// ```
pub fn protected_router(config: &ServerConfig) -> Router<AppState> {
    let index = config.public_dir.join(INDEX_PAGE);
    Router::new()
        .route_service("/", ServeFile::new(&index))
        .route_service(&format!("/public/{INDEX_PAGE}"), ServeFile::new(index))
        .route("/logout", get(auth::logout))
}
