use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::data::models::StoreError;
use crate::schema::user_words;

/// Where a saved word sits in the review cycle. The variant order is the
/// order the review queue presents words in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    New,
    Learning,
    Known,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised {field} value: {value:?}")]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
}

impl WordStatus {
    pub const ALL: [WordStatus; 3] = [WordStatus::New, WordStatus::Learning, WordStatus::Known];

    pub fn as_str(self) -> &'static str {
        match self {
            WordStatus::New => "new",
            WordStatus::Learning => "learning",
            WordStatus::Known => "known",
        }
    }
}

impl FromStr for WordStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WordStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidValue { field: "status", value: s.to_string() })
    }
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WordLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            WordLevel::Beginner => "beginner",
            WordLevel::Intermediate => "intermediate",
            WordLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for WordLevel {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(WordLevel::Beginner),
            "intermediate" => Ok(WordLevel::Intermediate),
            "advanced" => Ok(WordLevel::Advanced),
            other => Err(InvalidValue { field: "level", value: other.to_string() }),
        }
    }
}

impl fmt::Display for WordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `user_words` row as stored. Status and level are still strings here;
/// they become enums in [`WordRecord`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_words)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WordRow {
    pub word_id: i32,
    pub user_id: i32,
    pub word: String,
    pub meaning: String,
    pub example: Option<String>,
    pub level: String,
    pub status: String,
    pub next_review_at: Option<NaiveDateTime>,
    pub book_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A user's saved vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub id: i32,
    pub user_id: i32,
    pub word: String,
    pub meaning: String,
    pub example: Option<String>,
    pub level: WordLevel,
    pub status: WordStatus,
    pub next_review_at: Option<NaiveDateTime>,
    pub book_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<WordRow> for WordRecord {
    type Error = InvalidValue;

    fn try_from(row: WordRow) -> Result<Self, Self::Error> {
        Ok(WordRecord {
            id: row.word_id,
            user_id: row.user_id,
            status: row.status.parse()?,
            level: row.level.parse()?,
            word: row.word,
            meaning: row.meaning,
            example: row.example,
            next_review_at: row.next_review_at,
            book_id: row.book_id,
            book_title: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<(WordRow, Option<String>)> for WordRecord {
    type Error = InvalidValue;

    fn try_from((row, book_title): (WordRow, Option<String>)) -> Result<Self, Self::Error> {
        let mut record = WordRecord::try_from(row)?;
        record.book_title = book_title;
        Ok(record)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_words)]
pub struct NewWordRow<'a> {
    pub user_id: i32,
    pub word: &'a str,
    pub meaning: &'a str,
    pub example: Option<&'a str>,
    pub level: &'a str,
    pub status: &'a str,
    pub next_review_at: Option<NaiveDateTime>,
    pub book_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Payload for saving a word, whether picked while reading, produced by the
/// definition generator, or typed in by hand.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWord {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub word: String,
    #[validate(length(min = 1, max = 500), custom(function = "not_blank"))]
    pub meaning: String,
    #[validate(length(max = 1000))]
    pub example: Option<String>,
    #[serde(default)]
    pub level: WordLevel,
    pub book_id: Option<i32>,
}

/// Content edit. Scheduling fields are deliberately absent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WordUpdate {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub word: String,
    #[validate(length(min = 1, max = 500), custom(function = "not_blank"))]
    pub meaning: String,
    #[validate(length(max = 1000))]
    pub example: Option<String>,
    pub level: WordLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Alphabetical,
    NextReview,
}

/// Query string of the vocabulary list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordListParams {
    pub status: Option<WordStatus>,
    pub level: Option<WordLevel>,
    pub book_id: Option<i32>,
    #[serde(default)]
    pub sort: SortOrder,
    pub q: Option<String>,
}

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Invalid word: {0}")]
    Validation(String),
    #[error("Word not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
    #[error("Background task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, level: &str) -> WordRow {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        WordRow {
            word_id: 1,
            user_id: 7,
            word: "ephemeral".into(),
            meaning: "زودگذر".into(),
            example: None,
            level: level.into(),
            status: status.into(),
            next_review_at: None,
            book_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn status_strings_parse_both_ways() {
        for status in WordStatus::ALL {
            assert_eq!(status.as_str().parse::<WordStatus>(), Ok(status));
        }
        let err = "mastered".parse::<WordStatus>().unwrap_err();
        assert_eq!(err.field, "status");
        assert_eq!(err.value, "mastered");
    }

    #[test]
    fn status_order_puts_new_words_first() {
        assert!(WordStatus::New < WordStatus::Learning);
        assert!(WordStatus::Learning < WordStatus::Known);
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        assert!(WordRecord::try_from(row("learning", "advanced")).is_ok());
        assert!(WordRecord::try_from(row("mastered", "advanced")).is_err());
        assert!(WordRecord::try_from(row("new", "expert")).is_err());
    }

    #[test]
    fn blank_word_fails_validation() {
        let word = NewWord {
            word: "   ".into(),
            meaning: "something".into(),
            example: None,
            level: WordLevel::Beginner,
            book_id: None,
        };
        assert!(word.validate().is_err());

        let word = NewWord { word: "serene".into(), ..word };
        assert!(word.validate().is_ok());
    }

    #[test]
    fn record_serializes_with_camel_case_and_lowercase_enums() {
        let record = WordRecord::try_from(row("known", "intermediate")).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "known");
        assert_eq!(json["level"], "intermediate");
        assert_eq!(json["userId"], 7);
        assert!(json["nextReviewAt"].is_null());
        assert!(json.get("bookTitle").is_none());
    }
}
