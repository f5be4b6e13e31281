pub mod health;
pub mod pages;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers::{categories, wallpapers};
use crate::state::AppState;

/// Build the `/api` route tree. Every route here sits behind the session gate.
///
/// ```text
/// GET    /main-categories                 -> list_main
/// GET    /sub-categories?mainCategory=    -> list_sub
/// GET    /wallpapers                      -> list
/// POST   /wallpapers                      -> upload (multipart)
/// GET    /wallpapers/{id}                 -> get_by_id
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/main-categories", get(categories::list_main))
        .route("/sub-categories", get(categories::list_sub))
        .route(
            "/wallpapers",
            get(wallpapers::list).post(wallpapers::upload).layer(
                // Replaces axum's 2 MB default for the upload body.
                DefaultBodyLimit::max(config.max_upload_bytes),
            ),
        )
        .route("/wallpapers/{id}", get(wallpapers::get_by_id))
}
