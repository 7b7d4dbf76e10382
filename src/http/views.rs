use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::domain::post::Post;
use crate::http::error::AppError;

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|err| {
        tracing::error!(error = ?err, "template rendering failed");
        AppError::internal("failed to render page")
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Plain `302 Found` with a Location header; the form flows answer 302,
/// where `axum::response::Redirect` would emit 303 or 307.
pub fn redirect_found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// A post shaped for the templates: dates pre-formatted for display.
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub author_name: String,
    pub created_date: String,
    pub published_date: Option<String>,
}

impl PostView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            author_name: post.author_name.clone(),
            created_date: format_date(post.created_date),
            published_date: post.published_date.map(format_date),
        }
    }
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListTemplate {
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub post: PostView,
}

/// Shared by the new-post and edit-post pages.
#[derive(Template)]
#[template(path = "post_edit.html")]
pub struct PostEditTemplate {
    pub heading: &'static str,
    pub action: String,
    pub title_value: String,
    pub text_value: String,
}

#[derive(Template)]
#[template(path = "post_draft_list.html")]
pub struct PostDraftListTemplate {
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}
