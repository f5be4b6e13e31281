//! Handlers for the admin login form and logout.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Form};
use serde::Deserialize;

use crate::auth::session::{clear_session_cookie, read_cookie, session_cookie, SESSION_COOKIE};
use crate::middleware::auth::{SessionUser, LOGIN_PATH};
use crate::state::AppState;

/// Form body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /login
///
/// Success sets the session cookie and redirects to the dashboard; failure
/// redirects back to the login page with `?error=1`.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> impl IntoResponse {
    if !state
        .config
        .session
        .credentials_match(&form.username, &form.password)
    {
        tracing::warn!(username = %form.username, "Failed login attempt");
        return Redirect::to(&format!("{LOGIN_PATH}?error=1")).into_response();
    }

    let value = state.sessions.create(&form.username).await;
    tracing::info!(username = %form.username, "Admin logged in");

    (
        [(SET_COOKIE, session_cookie(&value, state.sessions.ttl()))],
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(value) = read_cookie(&headers, SESSION_COOKIE) {
        state.sessions.revoke(value).await;
    }
    tracing::info!(username = %user.username, "Admin logged out");

    (
        [(SET_COOKIE, clear_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
}
