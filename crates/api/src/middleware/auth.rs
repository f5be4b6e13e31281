//! Cookie session gate.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use wallhub_core::error::CoreError;

use crate::auth::session::{read_cookie, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// Path the gate sends anonymous page navigations to.
pub const LOGIN_PATH: &str = "/login";

/// The authenticated admin for the current request.
///
/// Handlers behind [`require_session`] can take this with
/// `Extension<SessionUser>`.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
}

/// Reject requests without a live session.
///
/// Anonymous `/api/*` requests get a `401` JSON error; anything else is
/// redirected to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match read_cookie(request.headers(), SESSION_COOKIE) {
        Some(value) => state.sessions.validate(value).await,
        None => None,
    };

    let Some(session) = session else {
        let path = request.uri().path();
        tracing::debug!(path, "Rejected anonymous request");
        return if is_api_path(path) {
            AppError::Core(CoreError::Unauthorized("Login required".into())).into_response()
        } else {
            Redirect::to(LOGIN_PATH).into_response()
        };
    };

    request.extensions_mut().insert(SessionUser {
        username: session.username,
    });
    next.run(request).await
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_paths_are_detected() {
        assert!(is_api_path("/api/wallpapers"));
        assert!(is_api_path("/api"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/"));
    }
}
