//! Authentication tests
//!
//! Covers the login/logout pages, the session cookie lifecycle, and signup.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};

// ===========================================================================
// Login
// ===========================================================================

#[tokio::test]
async fn login_form_renders() {
    let app = app().await;

    let resp = app.get("/accounts/login", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains(r#"id="login""#));
}

#[tokio::test]
async fn login_valid_credentials_sets_session_cookie() {
    let app = app().await;
    let user = app.create_user("auth_login_valid").await;

    let resp = app
        .post_form(
            "/accounts/login",
            &[("username", &user.username), ("password", DEFAULT_PASSWORD)],
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), "/");

    let cookie = resp.session_cookie().expect("no session cookie set");
    assert!(cookie.starts_with("encre_session="));

    // The fresh cookie authenticates a login-required page.
    let resp = app.get("/posts/new", Some(&cookie)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn login_invalid_password_rejected() {
    let app = app().await;
    let user = app.create_user("auth_login_badpw").await;

    let resp = app
        .post_form(
            "/accounts/login",
            &[("username", &user.username), ("password", "wrong_password")],
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.text().contains("invalid username or password"));
}

#[tokio::test]
async fn login_unknown_user_rejected_identically() {
    let app = app().await;

    let resp = app
        .post_form(
            "/accounts/login",
            &[("username", "nobody_here"), ("password", "whatever123")],
            None,
        )
        .await;

    // Same status and message as a wrong password (no user enumeration)
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.text().contains("invalid username or password"));
}

#[tokio::test]
async fn login_empty_fields_rejected() {
    let app = app().await;

    let resp = app
        .post_form(
            "/accounts/login",
            &[("username", ""), ("password", "somepassword")],
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Logout
// ===========================================================================

#[tokio::test]
async fn logout_revokes_session() {
    let app = app().await;
    let user = app.create_user("auth_logout").await;

    // Sanity: the session works before logout.
    let resp = app.get("/posts/new", Some(&user.session_cookie)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .post_form("/accounts/logout", &[], Some(&user.session_cookie))
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), "/");

    // The revoked cookie no longer authenticates.
    let resp = app.get("/posts/new", Some(&user.session_cookie)).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), "/accounts/login");
}

#[tokio::test]
async fn garbage_cookie_is_anonymous() {
    let app = app().await;

    let resp = app
        .get("/posts/new", Some("encre_session=not-a-real-token"))
        .await;

    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), "/accounts/login");
}

// ===========================================================================
// Signup
// ===========================================================================

#[tokio::test]
async fn signup_form_renders() {
    let app = app().await;

    let resp = app.get("/accounts/signup", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains(r#"id="signup""#));
}

#[tokio::test]
async fn signup_then_login() {
    let app = app().await;

    let resp = app
        .post_form(
            "/accounts/signup",
            &[("username", "auth_signup_new"), ("password", "longenough1")],
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), "/accounts/login");

    let resp = app
        .post_form(
            "/accounts/login",
            &[("username", "auth_signup_new"), ("password", "longenough1")],
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert!(resp.session_cookie().is_some());
}

#[tokio::test]
async fn signup_duplicate_username_conflicts() {
    let app = app().await;
    let user = app.create_user("auth_signup_dup").await;

    let resp = app
        .post_form(
            "/accounts/signup",
            &[("username", &user.username), ("password", "longenough1")],
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_short_password_rejected() {
    let app = app().await;

    let resp = app
        .post_form(
            "/accounts/signup",
            &[("username", "auth_signup_shortpw"), ("password", "short")],
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
