use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tera::{Context, Tera};
use tower_sessions::Session;

use crate::utils::{get_current_user_id, render_template};

async fn page_context(session: &Session, title: &str) -> (Context, Option<i32>) {
    let user_id = get_current_user_id(session).await;
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("logged_in", &user_id.is_some());
    (context, user_id)
}

pub async fn home(Extension(templates): Extension<Arc<Tera>>, session: Session) -> Html<String> {
    let (context, _) = page_context(&session, "کتاب‌یار").await;
    render_template(&templates, "home.html", context)
}

/// Pages that only make sense for a logged-in user send everyone else to
/// the login form.
async fn member_page(templates: &Tera, session: &Session, template: &str, title: &str) -> Response {
    let (context, user_id) = page_context(session, title).await;
    if user_id.is_none() {
        return Redirect::to("/auth/login").into_response();
    }
    render_template(templates, template, context).into_response()
}

pub async fn vocabulary_page(Extension(templates): Extension<Arc<Tera>>, session: Session) -> Response {
    member_page(&templates, &session, "vocabulary.html", "واژه‌های من").await
}

pub async fn review_page(Extension(templates): Extension<Arc<Tera>>, session: Session) -> Response {
    member_page(&templates, &session, "review.html", "مرور").await
}
