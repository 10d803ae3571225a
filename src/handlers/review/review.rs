use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_sessions::Session;

use crate::data::models::{ReviewError, ReviewResponse, StartReviewParams, WordRecord};
use crate::data::repositories::SqliteWordStore;
use crate::features::review::session::SessionView;
use crate::features::review::{QueueFilter, ReviewService};
use crate::utils;

type Service = ReviewService<SqliteWordStore>;

async fn current_user(session: &Session) -> Result<i32, ReviewError> {
    utils::get_current_user_id(session)
        .await
        .ok_or(ReviewError::NotLoggedIn)
}

fn filter_from(params: &StartReviewParams) -> QueueFilter {
    QueueFilter { level: params.level }
}

/// Words a new session would start with.
pub async fn due_words(
    State(service): State<Service>,
    session: Session,
    Query(params): Query<StartReviewParams>,
) -> Result<Json<Vec<WordRecord>>, ReviewError> {
    let user_id = current_user(&session).await?;
    let words = service
        .due(user_id, filter_from(&params), Utc::now().naive_utc())
        .await?;
    Ok(Json(words))
}

pub async fn start_session(
    State(service): State<Service>,
    session: Session,
    Query(params): Query<StartReviewParams>,
) -> Result<Json<SessionView>, ReviewError> {
    let user_id = current_user(&session).await?;
    let view = service
        .start(user_id, filter_from(&params), Utc::now().naive_utc())
        .await?;
    Ok(Json(view))
}

pub async fn current_card(
    State(service): State<Service>,
    session: Session,
) -> Result<Json<SessionView>, ReviewError> {
    let user_id = current_user(&session).await?;
    Ok(Json(service.view(user_id).await?))
}

pub async fn reveal(
    State(service): State<Service>,
    session: Session,
) -> Result<Json<SessionView>, ReviewError> {
    let user_id = current_user(&session).await?;
    Ok(Json(service.reveal(user_id).await?))
}

pub async fn respond(
    State(service): State<Service>,
    session: Session,
    Json(response): Json<ReviewResponse>,
) -> Result<Json<SessionView>, ReviewError> {
    let user_id = current_user(&session).await?;
    let view = service
        .respond(user_id, response.known, Utc::now().naive_utc())
        .await?;
    Ok(Json(view))
}

pub async fn retry(
    State(service): State<Service>,
    session: Session,
) -> Result<Json<SessionView>, ReviewError> {
    let user_id = current_user(&session).await?;
    Ok(Json(service.retry(user_id).await?))
}

pub async fn abandon(
    State(service): State<Service>,
    session: Session,
) -> Result<Json<utils::responses::ApiResponse>, ReviewError> {
    let user_id = current_user(&session).await?;
    service.abandon(user_id).await?;
    Ok(Json(utils::responses::ApiResponse {
        success: true,
        message: "Review session closed".to_string(),
    }))
}

pub fn review_router(service: Service) -> Router {
    Router::new()
        .route("/", get(current_card).delete(abandon))
        .route("/due", get(due_words))
        .route("/start", post(start_session))
        .route("/reveal", post(reveal))
        .route("/respond", post(respond))
        .route("/retry", post(retry))
        .with_state(service)
}
