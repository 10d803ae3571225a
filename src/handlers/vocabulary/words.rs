use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::Utc;
use tower_sessions::Session;
use validator::Validate;

use crate::data::models::{
    NewWord, VocabularyError, WordListParams, WordRecord, WordStats, WordUpdate,
};
use crate::data::repositories::SqliteWordStore;
use crate::features::review::WordStore;
use crate::features::vocabulary::VocabularySearch;
use crate::utils::{self, responses::ApiResponse};

async fn current_user(session: &Session) -> Result<i32, VocabularyError> {
    utils::get_current_user_id(session)
        .await
        .ok_or(VocabularyError::NotLoggedIn)
}

pub async fn list_words(
    State(store): State<SqliteWordStore>,
    session: Session,
    Query(params): Query<WordListParams>,
) -> Result<Json<Vec<WordRecord>>, VocabularyError> {
    let user_id = current_user(&session).await?;

    let query = params.q.clone();
    let words = tokio::task::spawn_blocking(move || store.list_for_user(user_id, &params)).await??;

    let words = match query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => VocabularySearch::search(q, words)
            .into_iter()
            .map(|(word, _)| word)
            .collect(),
        _ => words,
    };

    Ok(Json(words))
}

pub async fn get_word(
    State(store): State<SqliteWordStore>,
    session: Session,
    Path(word_id): Path<i32>,
) -> Result<Json<WordRecord>, VocabularyError> {
    let user_id = current_user(&session).await?;

    tokio::task::spawn_blocking(move || store.find_for_user(user_id, word_id))
        .await??
        .map(Json)
        .ok_or(VocabularyError::NotFound)
}

pub async fn create_word(
    State(store): State<SqliteWordStore>,
    session: Session,
    Json(payload): Json<NewWord>,
) -> Result<(StatusCode, Json<WordRecord>), VocabularyError> {
    let user_id = current_user(&session).await?;
    payload.validate()?;

    let now = Utc::now().naive_utc();
    let record = tokio::task::spawn_blocking(move || store.insert(user_id, &payload, now)).await??;
    log::info!("user {} saved word {}", user_id, record.id);

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_word(
    State(store): State<SqliteWordStore>,
    session: Session,
    Path(word_id): Path<i32>,
    Json(payload): Json<WordUpdate>,
) -> Result<Json<WordRecord>, VocabularyError> {
    let user_id = current_user(&session).await?;
    payload.validate()?;

    let now = Utc::now().naive_utc();
    let record = tokio::task::spawn_blocking(move || {
        store.update_content(user_id, word_id, &payload, now)
    })
    .await??;

    Ok(Json(record))
}

pub async fn delete_word(
    State(store): State<SqliteWordStore>,
    session: Session,
    Path(word_id): Path<i32>,
) -> Result<Json<ApiResponse>, VocabularyError> {
    let user_id = current_user(&session).await?;

    tokio::task::spawn_blocking(move || store.delete(user_id, word_id)).await??;
    log::info!("user {} deleted word {}", user_id, word_id);

    Ok(Json(ApiResponse {
        success: true,
        message: "Word deleted".to_string(),
    }))
}

pub async fn word_stats(
    State(store): State<SqliteWordStore>,
    session: Session,
) -> Result<Json<WordStats>, VocabularyError> {
    let user_id = current_user(&session).await?;

    let stats = tokio::task::spawn_blocking(move || store.stats(user_id)).await??;
    Ok(Json(stats))
}

pub fn vocabulary_router(store: SqliteWordStore) -> Router {
    Router::new()
        .route("/words", get(list_words).post(create_word))
        .route("/words/{word_id}", get(get_word).put(update_word).delete(delete_word))
        .route("/stats", get(word_stats))
        .with_state(store)
}
