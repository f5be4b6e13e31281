//! HTTP-level integration tests for the session gate.
//!
//! Covers login/logout, cookie validation, and how anonymous requests are
//! turned away (401 JSON for the API, redirect for pages).

mod common;

use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use common::{
    body_json, body_text, get, get_with_cookie, location, post_form, ADMIN_PASSWORD,
    ADMIN_USERNAME,
};
use sqlx::PgPool;

fn login_body(username: &str, password: &str) -> String {
    format!(
        "username={}&password={}",
        username,
        password.replace(' ', "+")
    )
}

/// Log in through the form and return the `Cookie` header value.
async fn login(app: &common::TestApp) -> String {
    let response = post_form(&app.router, "/login", &login_body(ADMIN_USERNAME, ADMIN_PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .expect("login must set the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Anonymous access
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_api_without_session_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    for uri in ["/api/main-categories", "/api/sub-categories?mainCategory=1", "/api/wallpapers"] {
        let response = get(&app.router, uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "UNAUTHORIZED");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dashboard_without_session_redirects_to_login(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app.router, "/").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_page_and_health_are_public(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app.router, "/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("action=\"/login\""));

    assert_eq!(get(&app.router, "/health").await.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_uploaded_files_are_public(pool: PgPool) {
    let app = common::build_test_app(pool);
    std::fs::write(app.upload_dir.path().join("1_sky.jpg"), b"pixels").unwrap();

    let response = get(&app.router, "/uploads/1_sky.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "pixels");
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success_sets_cookie_and_redirects_home(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_form(&app.router, "/login", &login_body(ADMIN_USERNAME, ADMIN_PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("wallhub_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert_eq!(app.sessions.len().await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_with_wrong_password_redirects_with_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_form(&app.router, "/login", &login_body(ADMIN_USERNAME, "nope")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?error=1"));
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert!(app.sessions.is_empty().await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_cookie_grants_access(pool: PgPool) {
    let app = common::build_test_app(pool);
    let cookie = login(&app).await;

    let response = get_with_cookie(&app.router, "/api/main-categories", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_cookie(&app.router, "/", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("/api/wallpapers"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tampered_cookie_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let cookie = login(&app).await;

    // Flip the last hex digit of the signature.
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });

    let response = get_with_cookie(&app.router, "/api/wallpapers", &tampered).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with_cookie(&app.router, "/api/wallpapers", "wallhub_session=garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    let cookie = login(&app).await;

    let response = get_with_cookie(&app.router, "/logout", &cookie).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    let cleared = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = get_with_cookie(&app.router, "/api/wallpapers", &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dashboard_file_is_gated_under_public(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app.router, "/public/index.html").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));

    let cookie = app.session_cookie().await;
    let response = get_with_cookie(&app.router, "/public/index.html", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Other public assets stay reachable anonymously.
    let response = get(&app.router, "/public/login.html").await;
    assert_eq!(response.status(), StatusCode::OK);
}
