use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::AuthService;
use crate::app::posts::PostService;
use crate::http::auth::SESSION_COOKIE;
use crate::http::views::{
    redirect_found, render_template, render_template_response, LoginTemplate, PostDetailTemplate,
    PostDraftListTemplate, PostEditTemplate, PostListTemplate, PostView, SignupTemplate,
};
use crate::http::{AppError, AuthUser};
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 20_000;
const MAX_USERNAME_LEN: usize = 150;
const MAX_PASSWORD_LEN: usize = 128;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Post pages
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
}

/// Trimmed title/text, or `None` when the form should be re-rendered.
fn validated_post_form(form: &PostForm) -> Option<(String, String)> {
    let title = form.title.trim();
    let text = form.text.trim();
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return None;
    }
    if text.is_empty() || text.len() > MAX_TEXT_LEN {
        return None;
    }
    Some((title.to_string(), text.to_string()))
}

pub async fn post_list(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service.list_published().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    let posts = posts.iter().map(PostView::from_post).collect();
    render_template(PostListTemplate { posts })
}

pub async fn post_detail(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    match post {
        Some(post) => render_template(PostDetailTemplate {
            post: PostView::from_post(&post),
        }),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn post_new_form(_auth: AuthUser) -> Result<Html<String>, AppError> {
    render_template(PostEditTemplate {
        heading: "New post",
        action: "/posts/new".to_string(),
        title_value: String::new(),
        text_value: String::new(),
    })
}

pub async fn post_new(
    auth: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let Some((title, text)) = validated_post_form(&form) else {
        return Ok(render_template_response(
            PostEditTemplate {
                heading: "New post",
                action: "/posts/new".to_string(),
                title_value: form.title.clone(),
                text_value: form.text.clone(),
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ));
    };

    let service = PostService::new(state.db.clone());
    let post = service
        .create_post(auth.user_id, title, text, Some(OffsetDateTime::now_utc()))
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    Ok(redirect_found(&format!("/posts/{}", post.id)))
}

pub async fn post_edit_form(
    _auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    match post {
        Some(post) => render_template(PostEditTemplate {
            heading: "Edit post",
            action: format!("/posts/{}/edit", post.id),
            title_value: post.title,
            text_value: post.text,
        }),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn post_edit(
    _auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let Some((title, text)) = validated_post_form(&form) else {
        return Ok(render_template_response(
            PostEditTemplate {
                heading: "Edit post",
                action: format!("/posts/{}/edit", id),
                title_value: form.title.clone(),
                text_value: form.text.clone(),
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ));
    };

    let service = PostService::new(state.db.clone());
    let post = service.update_post(id, title, text).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to update post");
        AppError::internal("failed to update post")
    })?;

    match post {
        Some(post) => Ok(redirect_found(&format!("/posts/{}", post.id))),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn post_draft_list(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service.list_drafts().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list drafts");
        AppError::internal("failed to list drafts")
    })?;

    let posts = posts.iter().map(PostView::from_post).collect();
    render_template(PostDraftListTemplate { posts })
}

pub async fn post_publish(
    _auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.publish_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to publish post");
        AppError::internal("failed to publish post")
    })?;

    match post {
        Some(post) => Ok(redirect_found(&format!("/posts/{}", post.id))),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn post_remove(
    _auth: AuthUser,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let service = PostService::new(state.db.clone());
    let removed = service.delete_post(id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = id, "failed to remove post");
        AppError::internal("failed to remove post")
    })?;

    if !removed {
        return Err(AppError::not_found("post not found"));
    }

    Ok(redirect_found("/"))
}

// ---------------------------------------------------------------------------
// Account pages
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

pub async fn signup_form() -> Result<Html<String>, AppError> {
    render_template(SignupTemplate)
}

pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::bad_request(
            "username must be at most 150 characters",
        ));
    }
    if form.password.trim().len() < 8 {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    if form.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at most 128 characters",
        ));
    }

    let service = AuthService::new(state.db.clone(), state.session_key, state.session_ttl_days);
    service
        .signup(username.to_string(), form.password)
        .await
        .map_err(|err| {
            if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
                if let Some(db_err) = sqlx_err.as_database_error() {
                    if let Some(code) = db_err.code() {
                        if code == "23505" {
                            return AppError::conflict("username already taken");
                        }
                    }
                }
            }
            tracing::error!(error = ?err, "failed to sign up");
            AppError::internal("failed to sign up")
        })?;

    Ok(redirect_found("/accounts/login"))
}

pub async fn login_form() -> Result<Html<String>, AppError> {
    render_template(LoginTemplate { error: None })
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if form.username.trim().is_empty() || form.password.trim().is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }
    if form.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at most 128 characters",
        ));
    }

    let service = AuthService::new(state.db.clone(), state.session_key, state.session_ttl_days);
    let session = service
        .login(&form.username, &form.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to log in");
            AppError::internal("failed to log in")
        })?;

    let Some(session) = session else {
        return Ok(render_template_response(
            LoginTemplate {
                error: Some("invalid username or password".to_string()),
            },
            StatusCode::UNAUTHORIZED,
        ));
    };

    let max_age = session.expires_at - OffsetDateTime::now_utc();
    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    Ok((jar.add(cookie), redirect_found("/")).into_response())
}

pub async fn logout(
    _auth: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let service = AuthService::new(state.db.clone(), state.session_key, state.session_ttl_days);
        service.logout(cookie.value()).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to log out");
            AppError::internal("failed to log out")
        })?;
    }

    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    Ok((jar.remove(removal), redirect_found("/")).into_response())
}
