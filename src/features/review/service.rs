use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::data::models::{ReviewError, ReviewOutcome, SessionState, StoreError, WordRecord};
use crate::features::review::queue::QueueFilter;
use crate::features::review::session::{ReviewSession, SessionView};
use crate::features::review::store::WordStore;

/// Review sessions by user id. The lock is only held for state changes,
/// never while waiting on the store.
pub type SessionRegistry = Arc<Mutex<HashMap<i32, ReviewSession>>>;

/// Drives review sessions against a word store.
pub struct ReviewService<S> {
    store: Arc<S>,
    sessions: SessionRegistry,
    generations: Arc<AtomicU64>,
    store_timeout: Duration,
    page_size: i64,
}

impl<S> Clone for ReviewService<S> {
    fn clone(&self) -> Self {
        ReviewService {
            store: self.store.clone(),
            sessions: self.sessions.clone(),
            generations: self.generations.clone(),
            store_timeout: self.store_timeout,
            page_size: self.page_size,
        }
    }
}

impl<S: WordStore + 'static> ReviewService<S> {
    pub fn new(store: Arc<S>, store_timeout: Duration, page_size: i64) -> Self {
        ReviewService {
            store,
            sessions: SessionRegistry::default(),
            generations: Arc::new(AtomicU64::new(1)),
            store_timeout,
            page_size,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The queue a session started now would get, without starting one.
    pub async fn due(
        &self,
        user_id: i32,
        filter: QueueFilter,
        now: NaiveDateTime,
    ) -> Result<Vec<WordRecord>, ReviewError> {
        let limit = self.page_size;
        self.run_store(move |store| store.find_due_for_user(user_id, now, filter, limit))
            .await
    }

    /// Fetches a fresh queue and replaces whatever session the user had.
    pub async fn start(
        &self,
        user_id: i32,
        filter: QueueFilter,
        now: NaiveDateTime,
    ) -> Result<SessionView, ReviewError> {
        Self::ensure_idle(&*self.sessions.lock().await, user_id, "start a new session")?;

        let queue = self.due(user_id, filter, now).await?;
        log::info!("user {} started a review of {} words", user_id, queue.len());

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let session = ReviewSession::start(generation, queue);
        let view = session.view();

        let mut sessions = self.sessions.lock().await;
        // An answer may have been sent to the old session during the fetch.
        Self::ensure_idle(&sessions, user_id, "start a new session")?;
        sessions.insert(user_id, session);
        Ok(view)
    }

    pub async fn view(&self, user_id: i32) -> Result<SessionView, ReviewError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&user_id)
            .map(ReviewSession::view)
            .ok_or(ReviewError::NoSession)
    }

    pub async fn reveal(&self, user_id: i32) -> Result<SessionView, ReviewError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&user_id).ok_or(ReviewError::NoSession)?;
        session.reveal()?;
        Ok(session.view())
    }

    /// Records a known/not-known answer for the current card.
    pub async fn respond(
        &self,
        user_id: i32,
        known: bool,
        now: NaiveDateTime,
    ) -> Result<SessionView, ReviewError> {
        let (generation, outcome) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&user_id).ok_or(ReviewError::NoSession)?;
            (session.generation(), session.begin_submit(known, now)?)
        };
        self.persist(user_id, generation, outcome).await
    }

    /// Re-sends the answer whose write failed last time.
    pub async fn retry(&self, user_id: i32) -> Result<SessionView, ReviewError> {
        let (generation, outcome) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&user_id).ok_or(ReviewError::NoSession)?;
            (session.generation(), session.begin_retry()?)
        };
        self.persist(user_id, generation, outcome).await
    }

    /// Drops the user's session. Refused while an answer is being saved, so
    /// the answer can't outlive the session that has to report on it.
    pub async fn abandon(&self, user_id: i32) -> Result<(), ReviewError> {
        let mut sessions = self.sessions.lock().await;
        Self::ensure_idle(&sessions, user_id, "abandon the session")?;
        sessions.remove(&user_id);
        Ok(())
    }

    fn ensure_idle(
        sessions: &HashMap<i32, ReviewSession>,
        user_id: i32,
        action: &'static str,
    ) -> Result<(), ReviewError> {
        match sessions.get(&user_id) {
            Some(session) if session.state() == SessionState::Submitting => {
                Err(ReviewError::InvalidState { action, state: SessionState::Submitting })
            }
            _ => Ok(()),
        }
    }

    async fn persist(
        &self,
        user_id: i32,
        generation: u64,
        outcome: ReviewOutcome,
    ) -> Result<SessionView, ReviewError> {
        let word_id = outcome.word_id;
        let result = self
            .run_store(move |store| store.update_review_outcome(user_id, &outcome))
            .await;

        let mut sessions = self.sessions.lock().await;
        let session = match sessions.get_mut(&user_id) {
            Some(session) if session.awaits(generation, word_id) => session,
            _ => {
                log::warn!(
                    "review session of user {} changed while word {} was being saved",
                    user_id, word_id
                );
                return Err(ReviewError::NoSession);
            }
        };
        match result {
            Ok(()) => {
                session.finish_submit(Ok(()));
                Ok(session.view())
            }
            Err(e) => {
                log::warn!("saving review of word {} for user {} failed: {}", word_id, user_id, e);
                session.finish_submit(Err(&e));
                Err(e)
            }
        }
    }

    async fn run_store<T, F>(&self, f: F) -> Result<T, ReviewError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || f(&store));
        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(result)) => result.map_err(ReviewError::from),
            Ok(Err(join_error)) => Err(ReviewError::Task(join_error.to_string())),
            Err(_) => Err(ReviewError::Timeout(self.store_timeout)),
        }
    }
}
