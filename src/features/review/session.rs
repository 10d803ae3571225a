//! One user's pass through a review queue.
//!
//! ```text
//! AwaitingReveal --reveal--> MeaningRevealed --answer--> Submitting
//!       ^                          ^                        |
//!       |                          +------- write failed ---+
//!       +------------- write ok, more words ----------------+
//!                                  Completed <-- write ok, queue empty
//! ```
//!
//! The queue is fixed when the session starts. Nothing advances until the
//! store confirms the write.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::data::models::{ReviewError, ReviewOutcome, SessionState, WordLevel, WordRecord, WordStatus};
use crate::features::review::scheduler::{self, IntervalPreview};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewTally {
    pub known: u32,
    pub learning: u32,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    generation: u64,
    queue: Vec<WordRecord>,
    index: usize,
    state: SessionState,
    tally: ReviewTally,
    pending: Option<ReviewOutcome>,
    last_error: Option<String>,
}

impl ReviewSession {
    /// `generation` tells this session apart from earlier ones for the same
    /// user, so a write that outlives its session can't touch a newer one.
    pub fn start(generation: u64, queue: Vec<WordRecord>) -> Self {
        let state = if queue.is_empty() {
            SessionState::Completed
        } else {
            SessionState::AwaitingReveal
        };
        ReviewSession {
            generation,
            queue,
            index: 0,
            state,
            tally: ReviewTally::default(),
            pending: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this session is the one waiting on the write of `word_id`
    /// that was started under `generation`.
    pub fn awaits(&self, generation: u64, word_id: i32) -> bool {
        self.generation == generation
            && self.state == SessionState::Submitting
            && self.pending.as_ref().is_some_and(|p| p.word_id == word_id)
    }

    pub fn current(&self) -> Option<&WordRecord> {
        match self.state {
            SessionState::Completed => None,
            _ => self.queue.get(self.index),
        }
    }

    pub fn pending(&self) -> Option<&ReviewOutcome> {
        self.pending.as_ref()
    }

    pub fn reveal(&mut self) -> Result<(), ReviewError> {
        self.expect(SessionState::AwaitingReveal, "reveal the meaning")?;
        self.state = SessionState::MeaningRevealed;
        Ok(())
    }

    /// Schedules the answer for the current word and locks the card until
    /// [`finish_submit`](Self::finish_submit) is called. An answer matching a
    /// failed earlier attempt reuses that attempt's outcome.
    pub fn begin_submit(&mut self, known: bool, now: NaiveDateTime) -> Result<ReviewOutcome, ReviewError> {
        self.expect(SessionState::MeaningRevealed, "answer")?;
        let word = self.queue.get(self.index).ok_or(ReviewError::NoSession)?;

        let outcome = match self.pending.take() {
            Some(pending) if pending.word_id == word.id && pending.known == known => pending,
            _ => scheduler::review(word, known, now),
        };
        self.pending = Some(outcome.clone());
        self.state = SessionState::Submitting;
        Ok(outcome)
    }

    /// Re-sends the outcome of the last failed attempt.
    pub fn begin_retry(&mut self) -> Result<ReviewOutcome, ReviewError> {
        self.expect(SessionState::MeaningRevealed, "retry")?;
        let outcome = self.pending.clone().ok_or(ReviewError::NothingToRetry)?;
        self.state = SessionState::Submitting;
        Ok(outcome)
    }

    pub fn finish_submit(&mut self, result: Result<(), &ReviewError>) {
        if self.state != SessionState::Submitting {
            log::warn!("submission finished while session was {}", self.state);
            return;
        }

        match result {
            Ok(()) => {
                if let Some(outcome) = self.pending.take() {
                    match outcome.new_status {
                        WordStatus::Known => self.tally.known += 1,
                        WordStatus::New | WordStatus::Learning => self.tally.learning += 1,
                    }
                }
                self.last_error = None;
                self.index += 1;
                self.state = if self.index < self.queue.len() {
                    SessionState::AwaitingReveal
                } else {
                    SessionState::Completed
                };
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.state = SessionState::MeaningRevealed;
            }
        }
    }

    fn expect(&self, wanted: SessionState, action: &'static str) -> Result<(), ReviewError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(ReviewError::InvalidState { action, state: self.state })
        }
    }

    pub fn view(&self) -> SessionView {
        let revealed = matches!(
            self.state,
            SessionState::MeaningRevealed | SessionState::Submitting
        );
        SessionView {
            state: self.state,
            position: (self.index + 1).min(self.queue.len()),
            total: self.queue.len(),
            reviewed: self.index,
            tally: self.tally,
            card: self.current().map(|word| CardView {
                id: word.id,
                word: word.word.clone(),
                level: word.level,
                status: word.status,
                book_title: word.book_title.clone(),
                meaning: revealed.then(|| word.meaning.clone()),
                example: if revealed { word.example.clone() } else { None },
                intervals: scheduler::preview(word.status),
            }),
            retry_pending: self.state == SessionState::MeaningRevealed && self.pending().is_some(),
            last_error: self.last_error.clone(),
        }
    }
}

/// What the review page needs to draw the current card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: SessionState,
    pub position: usize,
    pub total: usize,
    pub reviewed: usize,
    pub tally: ReviewTally,
    pub card: Option<CardView>,
    pub retry_pending: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: i32,
    pub word: String,
    pub level: WordLevel,
    pub status: WordStatus,
    pub book_title: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub intervals: IntervalPreview,
}
