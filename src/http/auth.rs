use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::app::auth::AuthService;
use crate::http::views::redirect_found;
use crate::AppState;

pub const SESSION_COOKIE: &str = "encre_session";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub username: String,
}

/// Rejection for page routes: anonymous requests land on the login page.
#[derive(Debug)]
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        redirect_found("/accounts/login")
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(LoginRedirect)?;

        let service = AuthService::new(state.db.clone(), state.session_key, state.session_ttl_days);
        let session = service
            .authenticate_session(&token)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "failed to authenticate session");
                LoginRedirect
            })?;

        let session = session.ok_or(LoginRedirect)?;
        Ok(AuthUser {
            user_id: session.user_id,
            username: session.username,
        })
    }
}
