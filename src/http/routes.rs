use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn accounts() -> Router<AppState> {
    Router::new()
        .route("/accounts/signup", get(handlers::signup_form))
        .route("/accounts/signup", post(handlers::signup))
        .route("/accounts/login", get(handlers::login_form))
        .route("/accounts/login", post(handlers::login))
        .route("/accounts/logout", post(handlers::logout))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::post_list))
        .route("/drafts", get(handlers::post_draft_list))
        .route("/posts/new", get(handlers::post_new_form))
        .route("/posts/new", post(handlers::post_new))
        .route("/posts/:id", get(handlers::post_detail))
        .route("/posts/:id/edit", get(handlers::post_edit_form))
        .route("/posts/:id/edit", post(handlers::post_edit))
        .route("/posts/:id/publish", post(handlers::post_publish))
        .route("/posts/:id/remove", post(handlers::post_remove))
}
