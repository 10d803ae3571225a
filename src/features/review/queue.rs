//! Picks the words that are due for review and orders them for a session.
//!
//! A word is due when it has never been reviewed (`new`) or its
//! `next_review_at` has passed. New words come first, then learning, then
//! known; within a status the earliest due word leads.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::data::models::{WordLevel, WordRecord, WordRow, WordStatus};

pub const REVIEW_PAGE_SIZE: i64 = 10;
pub const MAX_REVIEW_PAGE_SIZE: i64 = 50;

/// Optional narrowing of the queue. Ordering is the same either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub level: Option<WordLevel>,
}

impl QueueFilter {
    pub fn matches(&self, record: &WordRecord) -> bool {
        self.level.is_none_or(|level| record.level == level)
    }
}

/// A learning or known word without a due time has lost its schedule; it is
/// treated as due so it can't silently drop out of review.
pub fn is_due(record: &WordRecord, now: NaiveDateTime) -> bool {
    if record.status == WordStatus::New {
        return true;
    }
    record.next_review_at.is_none_or(|at| at <= now)
}

pub fn queue_order(a: &WordRecord, b: &WordRecord) -> Ordering {
    a.status
        .cmp(&b.status)
        .then_with(|| a.next_review_at.cmp(&b.next_review_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Selection over records already in memory. Stores that pre-filter in
/// their own query language still pass their rows through here.
pub fn select_due<'a, I>(records: I, now: NaiveDateTime, filter: QueueFilter, limit: i64) -> Vec<WordRecord>
where
    I: IntoIterator<Item = &'a WordRecord>,
{
    let mut due: Vec<WordRecord> = records
        .into_iter()
        .filter(|record| filter.matches(record) && is_due(record, now))
        .cloned()
        .collect();
    due.sort_by(queue_order);
    due.truncate(limit.max(0) as usize);
    due
}

/// Logs records that break the scheduling invariants. They stay in the
/// queue either way.
pub fn check_integrity(record: &WordRecord, now: NaiveDateTime) {
    match (record.status, record.next_review_at) {
        (WordStatus::New, Some(at)) if at > now => {
            log::warn!(
                "word {} (user {}) is new but scheduled for {}; reviewing it now",
                record.id, record.user_id, at
            );
        }
        (WordStatus::Learning | WordStatus::Known, None) => {
            log::warn!(
                "word {} (user {}) is {} with no review time; reviewing it now",
                record.id, record.user_id, record.status
            );
        }
        _ => {}
    }
}

/// Turns fetched rows into queue entries. Rows whose status or level can't
/// be parsed can't be scheduled either, so they are logged and left out.
pub fn admit_rows<I>(rows: I, now: NaiveDateTime) -> Vec<WordRecord>
where
    I: IntoIterator<Item = (WordRow, Option<String>)>,
{
    rows.into_iter()
        .filter_map(|(row, book_title)| {
            let word_id = row.word_id;
            match WordRecord::try_from((row, book_title)) {
                Ok(record) => {
                    check_integrity(&record, now);
                    Some(record)
                }
                Err(e) => {
                    log::error!("skipping word {} in review queue: {}", word_id, e);
                    None
                }
            }
        })
        .collect()
}
