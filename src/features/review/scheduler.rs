//! Fixed-bucket review scheduler.
//!
//! A successful recall moves a word one step up (new -> learning -> known)
//! and pushes its next review out to 1, 3 or 7 days. A miss always brings the
//! word back in 4 hours, and a known word that was missed drops to learning.
//!
//! | current  | known | next     | due in  |
//! |----------|-------|----------|---------|
//! | new      | yes   | learning | 24h     |
//! | learning | yes   | known    | 3 days  |
//! | known    | yes   | known    | 7 days  |
//! | new      | no    | new      | 4h      |
//! | learning | no    | learning | 4h      |
//! | known    | no    | learning | 4h      |

use chrono::{Duration, NaiveDateTime};

use crate::data::models::{ReviewOutcome, WordRecord, WordStatus};

/// New status and due time produced by one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub status: WordStatus,
    pub next_review_at: NaiveDateTime,
}

const RETRY_HOURS: i64 = 4;

/// Status the word moves to after an answer.
pub fn next_status(current: WordStatus, known: bool) -> WordStatus {
    match (current, known) {
        (WordStatus::New, true) => WordStatus::Learning,
        (WordStatus::Learning, true) => WordStatus::Known,
        (WordStatus::Known, true) => WordStatus::Known,
        (WordStatus::New, false) => WordStatus::New,
        (WordStatus::Learning, false) => WordStatus::Learning,
        (WordStatus::Known, false) => WordStatus::Learning,
    }
}

/// How far out the next review lands for an answer.
pub fn interval_for(current: WordStatus, known: bool) -> Duration {
    if !known {
        return Duration::hours(RETRY_HOURS);
    }
    match current {
        WordStatus::New => Duration::hours(24),
        WordStatus::Learning => Duration::days(3),
        WordStatus::Known => Duration::days(7),
    }
}

pub fn schedule(current: WordStatus, known: bool, now: NaiveDateTime) -> Schedule {
    Schedule {
        status: next_status(current, known),
        next_review_at: now + interval_for(current, known),
    }
}

/// Runs an answer for `word` through the table, producing the outcome to
/// persist.
pub fn review(word: &WordRecord, known: bool, now: NaiveDateTime) -> ReviewOutcome {
    let Schedule { status, next_review_at } = schedule(word.status, known, now);
    ReviewOutcome {
        word_id: word.id,
        known,
        previous_status: word.status,
        new_status: status,
        next_review_at,
        reviewed_at: now,
    }
}

/// Due times for both answers, shown on the card before the user picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPreview {
    pub known_minutes: i64,
    pub unknown_minutes: i64,
}

pub fn preview(current: WordStatus) -> IntervalPreview {
    IntervalPreview {
        known_minutes: interval_for(current, true).num_minutes(),
        unknown_minutes: interval_for(current, false).num_minutes(),
    }
}
