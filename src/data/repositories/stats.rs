use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::data::models::{WordStats, WordStatus};
use crate::schema::word_stats;

/// Keeps the per-user vocabulary counters in `word_stats` in step with
/// `user_words`. Every function expects to run inside the caller's
/// transaction.
pub struct StatsRepository;

impl StatsRepository {
    pub fn get(conn: &mut SqliteConnection, user_id: i32) -> QueryResult<WordStats> {
        let stats = word_stats::table
            .find(user_id)
            .select(WordStats::as_select())
            .first(conn)
            .optional()?;
        Ok(stats.unwrap_or_else(|| WordStats::empty(user_id)))
    }

    fn ensure_row(conn: &mut SqliteConnection, user_id: i32) -> QueryResult<()> {
        diesel::insert_into(word_stats::table)
            .values(word_stats::user_id.eq(user_id))
            .on_conflict(word_stats::user_id)
            .do_nothing()
            .execute(conn)?;
        Ok(())
    }

    fn adjust(conn: &mut SqliteConnection, user_id: i32, status: WordStatus, delta: i32) -> QueryResult<()> {
        let target = word_stats::table.find(user_id);
        match status {
            WordStatus::New => diesel::update(target)
                .set(word_stats::new_words.eq(word_stats::new_words + delta))
                .execute(conn)?,
            WordStatus::Learning => diesel::update(target)
                .set(word_stats::learning_words.eq(word_stats::learning_words + delta))
                .execute(conn)?,
            WordStatus::Known => diesel::update(target)
                .set(word_stats::known_words.eq(word_stats::known_words + delta))
                .execute(conn)?,
        };
        Ok(())
    }

    pub fn on_word_added(conn: &mut SqliteConnection, user_id: i32) -> QueryResult<()> {
        Self::ensure_row(conn, user_id)?;
        diesel::update(word_stats::table.find(user_id))
            .set(word_stats::total_words.eq(word_stats::total_words + 1))
            .execute(conn)?;
        Self::adjust(conn, user_id, WordStatus::New, 1)
    }

    pub fn on_word_removed(conn: &mut SqliteConnection, user_id: i32, status: WordStatus) -> QueryResult<()> {
        Self::ensure_row(conn, user_id)?;
        diesel::update(word_stats::table.find(user_id))
            .set(word_stats::total_words.eq(word_stats::total_words - 1))
            .execute(conn)?;
        Self::adjust(conn, user_id, status, -1)
    }

    pub fn on_status_change(
        conn: &mut SqliteConnection,
        user_id: i32,
        old: WordStatus,
        new: WordStatus,
    ) -> QueryResult<()> {
        if old == new {
            return Ok(());
        }
        Self::ensure_row(conn, user_id)?;
        Self::adjust(conn, user_id, old, -1)?;
        Self::adjust(conn, user_id, new, 1)
    }

    /// Counts consecutive calendar days (UTC) with at least one review.
    pub fn on_review(conn: &mut SqliteConnection, user_id: i32, at: NaiveDateTime) -> QueryResult<()> {
        Self::ensure_row(conn, user_id)?;
        let stats = Self::get(conn, user_id)?;
        let streak = next_streak(stats.review_streak, stats.last_reviewed_at, at);
        diesel::update(word_stats::table.find(user_id))
            .set((
                word_stats::review_streak.eq(streak),
                word_stats::last_reviewed_at.eq(Some(at)),
            ))
            .execute(conn)?;
        Ok(())
    }
}

pub fn next_streak(current: i32, last_reviewed_at: Option<NaiveDateTime>, at: NaiveDateTime) -> i32 {
    let Some(last) = last_reviewed_at else {
        return 1;
    };
    let gap = (at.date() - last.date()).num_days();
    match gap {
        // Same day, or a clock that went backwards.
        i64::MIN..=0 => current.max(1),
        1 => current + 1,
        _ => 1,
    }
}
