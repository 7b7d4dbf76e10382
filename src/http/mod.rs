use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;
mod views;

pub use auth::{AuthUser, SESSION_COOKIE};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::accounts())
        .merge(routes::posts())
        .with_state(state)
}
