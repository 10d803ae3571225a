use chrono::NaiveDateTime;

use crate::data::models::{NewWord, ReviewOutcome, StoreError, WordRecord};
use crate::features::review::queue::QueueFilter;

/// Persistence the review flow depends on. Calls are blocking; async
/// callers run them on the blocking pool.
pub trait WordStore: Send + Sync {
    /// Due words for `user_id` at `now`, in queue order, at most `limit`.
    fn find_due_for_user(
        &self,
        user_id: i32,
        now: NaiveDateTime,
        filter: QueueFilter,
        limit: i64,
    ) -> Result<Vec<WordRecord>, StoreError>;

    /// Writes the scheduler's result for one word. An outcome is identified
    /// by its word and `reviewed_at`; applying it again is a no-op, even
    /// if the word was edited in between.
    fn update_review_outcome(&self, user_id: i32, outcome: &ReviewOutcome) -> Result<(), StoreError>;

    fn insert(&self, user_id: i32, word: &NewWord, now: NaiveDateTime) -> Result<WordRecord, StoreError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::data::models::WordStatus;
    use crate::features::review::queue::select_due;

    /// In-memory store with switchable failures, for exercising the session
    /// flow without a database.
    #[derive(Default)]
    pub(crate) struct MemoryWordStore {
        pub(crate) words: Mutex<Vec<WordRecord>>,
        pub(crate) fail_updates: AtomicUsize,
        pub(crate) fail_reads: AtomicUsize,
        pub(crate) update_delay: Mutex<Option<Duration>>,
        pub(crate) applied: AtomicUsize,
        reviews: Mutex<Vec<(i32, NaiveDateTime)>>,
    }

    impl MemoryWordStore {
        pub(crate) fn with_words(words: Vec<WordRecord>) -> Self {
            MemoryWordStore { words: Mutex::new(words), ..Default::default() }
        }

        pub(crate) fn word(&self, id: i32) -> Option<WordRecord> {
            self.words.lock().unwrap().iter().find(|w| w.id == id).cloned()
        }

        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl WordStore for MemoryWordStore {
        fn find_due_for_user(
            &self,
            user_id: i32,
            now: NaiveDateTime,
            filter: QueueFilter,
            limit: i64,
        ) -> Result<Vec<WordRecord>, StoreError> {
            if Self::take_failure(&self.fail_reads) {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            let words = self.words.lock().unwrap();
            Ok(select_due(words.iter().filter(|w| w.user_id == user_id), now, filter, limit))
        }

        fn update_review_outcome(&self, user_id: i32, outcome: &ReviewOutcome) -> Result<(), StoreError> {
            let delay = *self.update_delay.lock().unwrap();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            if Self::take_failure(&self.fail_updates) {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            let mut words = self.words.lock().unwrap();
            let word = words
                .iter_mut()
                .find(|w| w.id == outcome.word_id && w.user_id == user_id)
                .ok_or(StoreError::NotFound)?;
            let mut reviews = self.reviews.lock().unwrap();
            if reviews.contains(&(outcome.word_id, outcome.reviewed_at)) {
                return Ok(());
            }
            reviews.push((outcome.word_id, outcome.reviewed_at));
            word.status = outcome.new_status;
            word.next_review_at = Some(outcome.next_review_at);
            word.updated_at = outcome.reviewed_at;
            self.applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn insert(&self, user_id: i32, new: &NewWord, now: NaiveDateTime) -> Result<WordRecord, StoreError> {
            let mut words = self.words.lock().unwrap();
            let record = WordRecord {
                id: words.iter().map(|w| w.id).max().unwrap_or(0) + 1,
                user_id,
                word: new.word.trim().to_string(),
                meaning: new.meaning.trim().to_string(),
                example: new.example.clone(),
                level: new.level,
                status: WordStatus::New,
                next_review_at: None,
                book_id: new.book_id,
                book_title: None,
                created_at: now,
                updated_at: now,
            };
            words.push(record.clone());
            Ok(record)
        }
    }
}
