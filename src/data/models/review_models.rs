use std::{fmt, time::Duration};

use chrono::NaiveDateTime;
use diesel::result::Error as DieselError;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::models::{WordLevel, WordStatus};
use crate::schema::{word_reviews, word_stats};

/// The user's answer on a flashcard. Binary, no partial credit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReviewResponse {
    pub known: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartReviewParams {
    pub level: Option<WordLevel>,
}

/// Result of running one answer through the scheduler, waiting to be
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub word_id: i32,
    pub known: bool,
    pub previous_status: WordStatus,
    pub new_status: WordStatus,
    pub next_review_at: NaiveDateTime,
    pub reviewed_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = word_reviews)]
pub struct NewWordReview {
    pub word_id: i32,
    pub user_id: i32,
    pub knew_word: bool,
    pub reviewed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = word_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct WordStats {
    pub user_id: i32,
    pub total_words: i32,
    pub new_words: i32,
    pub learning_words: i32,
    pub known_words: i32,
    pub review_streak: i32,
    pub last_reviewed_at: Option<NaiveDateTime>,
}

impl WordStats {
    pub fn empty(user_id: i32) -> Self {
        WordStats {
            user_id,
            total_words: 0,
            new_words: 0,
            learning_words: 0,
            known_words: 0,
            review_streak: 0,
            last_reviewed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingReveal,
    MeaningRevealed,
    Submitting,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::AwaitingReveal => "awaiting reveal",
            SessionState::MeaningRevealed => "meaning revealed",
            SessionState::Submitting => "submitting",
            SessionState::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Failures of the word record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(DieselError),
    #[error("Connection pool error: {0}")]
    Pool(String),
    #[error("Word not found")]
    NotFound,
    #[error("Data integrity error: {0}")]
    Integrity(String),
    /// The database refused the write (foreign key, uniqueness, check). The
    /// same request will keep failing.
    #[error("Rejected by the database: {0}")]
    Constraint(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same call later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::Pool(_) | StoreError::Unavailable(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("No review session in progress")]
    NoSession,
    #[error("Cannot {action} while the card is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
    #[error("There is no failed answer to retry")]
    NothingToRetry,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ReviewError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ReviewError::Store(e) => e.is_transient(),
            ReviewError::Timeout(_) | ReviewError::Task(_) => true,
            _ => false,
        }
    }
}
