use axum::{
    extract::{Form, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use std::sync::Arc;
use tera::{Tera, Context};
use tower_sessions::Session;

use crate::{
    DbPool,
    utils::{clear_user_session, set_user_session, render_template},
    data::repositories::UserRepository
};
use crate::data::models::{LoginError, LoginForm};

pub async fn show_login_form(
    State((_pool, tera)): State<(DbPool, Arc<Tera>)>
) -> Result<Html<String>, LoginError> {
    let mut context = Context::new();
    context.insert("title", "ورود");
    Ok(render_template(&tera, "login.html", context))
}

#[axum::debug_handler]
pub async fn handle_login(
    State((pool, _tera)): State<(DbPool, Arc<Tera>)>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, LoginError> {
    let email = form.email.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<_, LoginError> {
        let mut conn = pool.get()?;
        let Some(user) = UserRepository::find_by_email(&mut conn, &form.email)? else {
            return Ok(None);
        };
        let is_valid = UserRepository::verify_password(&user.password, &form.password)?;
        Ok(is_valid.then_some(user))
    })
    .await??;

    match user {
        Some(user) => {
            set_user_session(&session, user.user_id, &user.email).await?;
            log::info!("User {} logged in", user.user_id);
            Ok(Redirect::to("/vocabulary"))
        }
        None => {
            log::warn!("Failed login for: {}", email);
            Err(LoginError::InvalidCredentials)
        }
    }
}

pub async fn handle_logout(session: Session) -> Result<Redirect, LoginError> {
    clear_user_session(&session).await?;
    Ok(Redirect::to("/"))
}

pub fn auth_router(pool: DbPool, tera: Arc<Tera>) -> Router {
    Router::new()
        .route("/login", get(show_login_form).post(handle_login))
        .route("/logout", get(handle_logout))
        .with_state((pool, tera))
}
