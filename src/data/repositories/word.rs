use chrono::NaiveDateTime;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::data::models::{
    NewWord, NewWordReview, NewWordRow, ReviewOutcome, SortOrder, StoreError, WordListParams,
    WordRecord, WordRow, WordStats, WordStatus, WordUpdate,
};
use crate::data::repositories::StatsRepository;
use crate::features::review::queue::{self, QueueFilter};
use crate::features::review::store::WordStore;
use crate::schema::{books, user_words, word_reviews};
use crate::DbPool;

/// Queue rank of the status column. Keep in step with the `Ord` of
/// `WordStatus`.
const STATUS_RANK: &str =
    "CASE user_words.status WHEN 'new' THEN 0 WHEN 'learning' THEN 1 ELSE 2 END";

/// `user_words` backed by SQLite.
#[derive(Clone)]
pub struct SqliteWordStore {
    pool: DbPool,
}

impl SqliteWordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }

    fn load_one(conn: &mut SqliteConnection, user_id: i32, word_id: i32) -> Result<Option<WordRecord>, StoreError> {
        let row = user_words::table
            .left_join(books::table)
            .filter(user_words::word_id.eq(word_id))
            .filter(user_words::user_id.eq(user_id))
            .select((WordRow::as_select(), books::title.nullable()))
            .first::<(WordRow, Option<String>)>(conn)
            .optional()?;
        row.map(WordRecord::try_from).transpose().map_err(StoreError::from)
    }

    pub fn find_for_user(&self, user_id: i32, word_id: i32) -> Result<Option<WordRecord>, StoreError> {
        let mut conn = self.conn()?;
        Self::load_one(&mut conn, user_id, word_id)
    }

    /// The vocabulary list. Free-text search happens on top of this, in
    /// `features::vocabulary`.
    pub fn list_for_user(&self, user_id: i32, params: &WordListParams) -> Result<Vec<WordRecord>, StoreError> {
        let mut conn = self.conn()?;

        let mut query = user_words::table
            .left_join(books::table)
            .filter(user_words::user_id.eq(user_id))
            .select((WordRow::as_select(), books::title.nullable()))
            .into_boxed();

        if let Some(status) = params.status {
            query = query.filter(user_words::status.eq(status.as_str()));
        }
        if let Some(level) = params.level {
            query = query.filter(user_words::level.eq(level.as_str()));
        }
        if let Some(book_id) = params.book_id {
            query = query.filter(user_words::book_id.eq(book_id));
        }

        query = match params.sort {
            SortOrder::Newest => query.order((user_words::created_at.desc(), user_words::word_id.desc())),
            SortOrder::Oldest => query.order((user_words::created_at.asc(), user_words::word_id.asc())),
            SortOrder::Alphabetical => query.order((user_words::word.asc(), user_words::word_id.asc())),
            SortOrder::NextReview => query.order((user_words::next_review_at.asc(), user_words::word_id.asc())),
        };

        let rows = query.load::<(WordRow, Option<String>)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let word_id = row.0.word_id;
                WordRecord::try_from(row)
                    .map_err(|e| log::error!("word {} has invalid data: {}", word_id, e))
                    .ok()
            })
            .collect())
    }

    pub fn update_content(
        &self,
        user_id: i32,
        word_id: i32,
        update: &WordUpdate,
        now: NaiveDateTime,
    ) -> Result<WordRecord, StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let changed = diesel::update(
                user_words::table
                    .filter(user_words::word_id.eq(word_id))
                    .filter(user_words::user_id.eq(user_id)),
            )
            .set((
                user_words::word.eq(update.word.trim()),
                user_words::meaning.eq(update.meaning.trim()),
                user_words::example.eq(update.example.as_deref().map(str::trim)),
                user_words::level.eq(update.level.as_str()),
                user_words::updated_at.eq(now),
            ))
            .execute(conn)?;

            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Self::load_one(conn, user_id, word_id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn delete(&self, user_id: i32, word_id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let status: String = user_words::table
                .filter(user_words::word_id.eq(word_id))
                .filter(user_words::user_id.eq(user_id))
                .select(user_words::status)
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound)?;

            diesel::delete(word_reviews::table.filter(word_reviews::word_id.eq(word_id))).execute(conn)?;
            diesel::delete(user_words::table.filter(user_words::word_id.eq(word_id))).execute(conn)?;

            StatsRepository::on_word_removed(conn, user_id, status.parse::<WordStatus>()?)?;
            Ok(())
        })
    }

    pub fn stats(&self, user_id: i32) -> Result<WordStats, StoreError> {
        let mut conn = self.conn()?;
        Ok(StatsRepository::get(&mut conn, user_id)?)
    }

    /// A review is identified by its word and the moment it was answered.
    fn review_logged(conn: &mut SqliteConnection, user_id: i32, outcome: &ReviewOutcome) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            word_reviews::table
                .filter(word_reviews::word_id.eq(outcome.word_id))
                .filter(word_reviews::user_id.eq(user_id))
                .filter(word_reviews::reviewed_at.eq(outcome.reviewed_at)),
        ))
        .get_result(conn)
    }
}

impl WordStore for SqliteWordStore {
    fn find_due_for_user(
        &self,
        user_id: i32,
        now: NaiveDateTime,
        filter: QueueFilter,
        limit: i64,
    ) -> Result<Vec<WordRecord>, StoreError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn()?;

        let due_rows = || {
            let mut query = user_words::table
                .left_join(books::table)
                .filter(user_words::user_id.eq(user_id))
                .filter(
                    user_words::status
                        .eq(WordStatus::New.as_str())
                        .or(user_words::next_review_at.le(now))
                        .or(user_words::next_review_at.is_null()),
                )
                .select((WordRow::as_select(), books::title.nullable()))
                .into_boxed();
            if let Some(level) = filter.level {
                query = query.filter(user_words::level.eq(level.as_str()));
            }
            query
                .order(sql::<Integer>(STATUS_RANK))
                .then_order_by(user_words::next_review_at.asc())
                .then_order_by(user_words::word_id.asc())
        };

        // Rows that fail to parse are dropped after loading, so keep paging
        // until the queue is full or the due rows run out.
        let mut admitted = Vec::new();
        let mut offset = 0;
        loop {
            let rows = due_rows()
                .limit(limit)
                .offset(offset)
                .load::<(WordRow, Option<String>)>(&mut conn)?;
            let fetched = rows.len() as i64;
            admitted.extend(queue::admit_rows(rows, now));
            offset += fetched;
            if fetched < limit || admitted.len() as i64 >= limit {
                break;
            }
        }

        Ok(queue::select_due(&admitted, now, filter, limit))
    }

    fn update_review_outcome(&self, user_id: i32, outcome: &ReviewOutcome) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let current = Self::load_one(conn, user_id, outcome.word_id)?.ok_or(StoreError::NotFound)?;
            if Self::review_logged(conn, user_id, outcome)? {
                log::debug!("review of word {} already stored", outcome.word_id);
                return Ok(());
            }

            diesel::update(
                user_words::table
                    .filter(user_words::word_id.eq(outcome.word_id))
                    .filter(user_words::user_id.eq(user_id)),
            )
            .set((
                user_words::status.eq(outcome.new_status.as_str()),
                user_words::next_review_at.eq(Some(outcome.next_review_at)),
                user_words::updated_at.eq(outcome.reviewed_at),
            ))
            .execute(conn)?;

            diesel::insert_into(word_reviews::table)
                .values(&NewWordReview {
                    word_id: outcome.word_id,
                    user_id,
                    knew_word: outcome.known,
                    reviewed_at: outcome.reviewed_at,
                })
                .execute(conn)?;

            // Another device may have moved the word since this session
            // loaded it, so count from what is stored now.
            StatsRepository::on_status_change(conn, user_id, current.status, outcome.new_status)?;
            StatsRepository::on_review(conn, user_id, outcome.reviewed_at)?;
            Ok(())
        })
    }

    fn insert(&self, user_id: i32, word: &NewWord, now: NaiveDateTime) -> Result<WordRecord, StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(user_words::table)
                .values(&NewWordRow {
                    user_id,
                    word: word.word.trim(),
                    meaning: word.meaning.trim(),
                    example: word.example.as_deref().map(str::trim),
                    level: word.level.as_str(),
                    status: WordStatus::New.as_str(),
                    next_review_at: None,
                    book_id: word.book_id,
                    created_at: now,
                    updated_at: now,
                })
                .execute(conn)?;

            let word_id = diesel::select(sql::<Integer>("last_insert_rowid()")).get_result::<i32>(conn)?;
            StatsRepository::on_word_added(conn, user_id)?;
            Self::load_one(conn, user_id, word_id)?.ok_or(StoreError::NotFound)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::data::db::test_pool;
    use crate::data::models::WordLevel;
    use crate::data::repositories::UserRepository;
    use crate::features::review::queue::tests::t;
    use crate::features::review::scheduler;

    fn store_with_user() -> (SqliteWordStore, i32) {
        let pool = test_pool();
        let user = {
            let mut conn = pool.get().unwrap();
            UserRepository::create_user(&mut conn, "reader@example.com", "correct horse").unwrap()
        };
        (SqliteWordStore::new(pool), user.user_id)
    }

    fn new_word(word: &str) -> NewWord {
        NewWord {
            word: word.into(),
            meaning: format!("معنی {word}"),
            example: None,
            level: WordLevel::Beginner,
            book_id: None,
        }
    }

    /// Forces scheduling fields, bypassing the scheduler, to set up fixtures.
    fn set_schedule(store: &SqliteWordStore, word_id: i32, status: WordStatus, at: Option<NaiveDateTime>) {
        let mut conn = store.conn().unwrap();
        diesel::update(user_words::table.find(word_id))
            .set((user_words::status.eq(status.as_str()), user_words::next_review_at.eq(at)))
            .execute(&mut conn)
            .unwrap();
    }

    #[test]
    fn test_insert_starts_new_and_counts() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("  candid "), t()).unwrap();

        assert_eq!(record.word, "candid");
        assert_eq!(record.status, WordStatus::New);
        assert_eq!(record.next_review_at, None);

        let stats = store.stats(user_id).unwrap();
        assert_eq!((stats.total_words, stats.new_words), (1, 1));
    }

    #[test]
    fn test_due_scenario_matches_queue_order() {
        let (store, user_id) = store_with_user();
        let a = store.insert(user_id, &new_word("alpha"), t()).unwrap();
        let b = store.insert(user_id, &new_word("beta"), t()).unwrap();
        let c = store.insert(user_id, &new_word("gamma"), t()).unwrap();
        set_schedule(&store, b.id, WordStatus::Learning, Some(t() + Duration::days(1)));
        set_schedule(&store, c.id, WordStatus::Known, Some(t() - Duration::hours(1)));

        let due = store.find_due_for_user(user_id, t(), QueueFilter::default(), 10).unwrap();
        let ids: Vec<i32> = due.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn test_sql_selection_agrees_with_reference() {
        let (store, user_id) = store_with_user();
        let fixtures = [
            (WordStatus::New, None),
            (WordStatus::New, Some(t() + Duration::hours(3))),
            (WordStatus::Learning, Some(t() - Duration::hours(2))),
            (WordStatus::Learning, Some(t() - Duration::hours(9))),
            (WordStatus::Learning, Some(t() + Duration::hours(1))),
            (WordStatus::Known, Some(t())),
            (WordStatus::Known, Some(t() + Duration::days(6))),
        ];
        for (i, (status, at)) in fixtures.iter().enumerate() {
            let record = store.insert(user_id, &new_word(&format!("w{i}")), t()).unwrap();
            set_schedule(&store, record.id, *status, *at);
        }

        let all = store.list_for_user(user_id, &WordListParams::default()).unwrap();
        let expected: Vec<i32> = queue::select_due(&all, t(), QueueFilter::default(), 100)
            .iter()
            .map(|w| w.id)
            .collect();
        let actual: Vec<i32> = store
            .find_due_for_user(user_id, t(), QueueFilter::default(), 100)
            .unwrap()
            .iter()
            .map(|w| w.id)
            .collect();

        assert_eq!(actual, expected);
        assert_eq!(actual.len(), 5);
    }

    #[test]
    fn test_reviewed_word_not_due_again_at_same_time() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("brisk"), t()).unwrap();

        let outcome = scheduler::review(&record, true, t());
        store.update_review_outcome(user_id, &outcome).unwrap();

        let due = store.find_due_for_user(user_id, t(), QueueFilter::default(), 10).unwrap();
        assert!(due.is_empty());

        let stored = store.find_for_user(user_id, record.id).unwrap().unwrap();
        assert_eq!(stored.status, WordStatus::Learning);
        assert_eq!(stored.next_review_at, Some(t() + Duration::hours(24)));
        assert_eq!(stored.updated_at, t());
    }

    #[test]
    fn test_outcome_updates_stats_and_log_once() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("vivid"), t()).unwrap();
        let outcome = scheduler::review(&record, true, t());

        store.update_review_outcome(user_id, &outcome).unwrap();
        store.update_review_outcome(user_id, &outcome).unwrap();

        let stats = store.stats(user_id).unwrap();
        assert_eq!((stats.new_words, stats.learning_words), (0, 1));
        assert_eq!(stats.review_streak, 1);
        assert_eq!(stats.last_reviewed_at, Some(t()));

        let mut conn = store.conn().unwrap();
        let logged: i64 = word_reviews::table.count().get_result(&mut conn).unwrap();
        assert_eq!(logged, 1);
    }

    #[test]
    fn test_outcome_for_someone_elses_word_is_not_found() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("stoic"), t()).unwrap();
        let outcome = scheduler::review(&record, true, t());

        let err = store.update_review_outcome(user_id + 1, &outcome).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_corrupt_status_is_skipped_not_fatal() {
        let (store, user_id) = store_with_user();
        let good = store.insert(user_id, &new_word("keen"), t()).unwrap();
        let bad = store.insert(user_id, &new_word("odd"), t()).unwrap();
        {
            let mut conn = store.conn().unwrap();
            diesel::update(user_words::table.find(bad.id))
                .set(user_words::status.eq("mastered"))
                .execute(&mut conn)
                .unwrap();
        }

        let due = store.find_due_for_user(user_id, t(), QueueFilter::default(), 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, good.id);
    }

    #[test]
    fn test_level_filter() {
        let (store, user_id) = store_with_user();
        store.insert(user_id, &new_word("easy"), t()).unwrap();
        let hard = store
            .insert(user_id, &NewWord { level: WordLevel::Advanced, ..new_word("abstruse") }, t())
            .unwrap();

        let filter = QueueFilter { level: Some(WordLevel::Advanced) };
        let due = store.find_due_for_user(user_id, t(), filter, 10).unwrap();
        assert_eq!(due.iter().map(|w| w.id).collect::<Vec<_>>(), vec![hard.id]);
    }

    #[test]
    fn test_book_title_is_joined() {
        let (store, user_id) = store_with_user();
        {
            let mut conn = store.conn().unwrap();
            diesel::insert_into(books::table)
                .values((books::book_id.eq(4), books::title.eq("بوف کور"), books::slug.eq("boof-e-koor")))
                .execute(&mut conn)
                .unwrap();
        }
        let record = store
            .insert(user_id, &NewWord { book_id: Some(4), ..new_word("owl") }, t())
            .unwrap();
        assert_eq!(record.book_title.as_deref(), Some("بوف کور"));
    }

    #[test]
    fn test_edit_keeps_schedule_and_delete_updates_stats() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("terse"), t()).unwrap();
        store
            .update_review_outcome(user_id, &scheduler::review(&record, true, t()))
            .unwrap();

        let edited = store
            .update_content(
                user_id,
                record.id,
                &WordUpdate {
                    word: "terse".into(),
                    meaning: "موجز".into(),
                    example: Some("A terse reply.".into()),
                    level: WordLevel::Intermediate,
                },
                t() + Duration::hours(1),
            )
            .unwrap();
        assert_eq!(edited.meaning, "موجز");
        assert_eq!(edited.status, WordStatus::Learning);
        assert_eq!(edited.next_review_at, Some(t() + Duration::hours(24)));

        store.delete(user_id, record.id).unwrap();
        assert!(store.find_for_user(user_id, record.id).unwrap().is_none());
        let stats = store.stats(user_id).unwrap();
        assert_eq!((stats.total_words, stats.learning_words), (0, 0));

        assert!(matches!(store.delete(user_id, record.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_missing_book_is_rejected_not_retryable() {
        let (store, user_id) = store_with_user();
        let err = store
            .insert(user_id, &NewWord { book_id: Some(999), ..new_word("orphan") }, t())
            .unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)), "{err}");
        assert!(!err.is_transient());
        assert_eq!(store.stats(user_id).unwrap().total_words, 0);
    }

    #[test]
    fn test_corrupt_rows_do_not_take_queue_slots() {
        let (store, user_id) = store_with_user();
        let bad = store.insert(user_id, &new_word("blurred"), t()).unwrap();
        let good = store.insert(user_id, &new_word("clear"), t()).unwrap();
        {
            let mut conn = store.conn().unwrap();
            diesel::update(user_words::table.find(bad.id))
                .set(user_words::level.eq("expert"))
                .execute(&mut conn)
                .unwrap();
        }

        let due = store.find_due_for_user(user_id, t(), QueueFilter::default(), 1).unwrap();
        assert_eq!(due.iter().map(|w| w.id).collect::<Vec<_>>(), vec![good.id]);
    }

    #[test]
    fn test_replayed_outcome_after_edit_is_logged_once() {
        let (store, user_id) = store_with_user();
        let record = store.insert(user_id, &new_word("lucid"), t()).unwrap();
        let outcome = scheduler::review(&record, true, t());
        store.update_review_outcome(user_id, &outcome).unwrap();

        store
            .update_content(
                user_id,
                record.id,
                &WordUpdate {
                    word: "lucid".into(),
                    meaning: "روشن".into(),
                    example: None,
                    level: WordLevel::Beginner,
                },
                t() + Duration::minutes(5),
            )
            .unwrap();
        store.update_review_outcome(user_id, &outcome).unwrap();

        let mut conn = store.conn().unwrap();
        let logged: i64 = word_reviews::table.count().get_result(&mut conn).unwrap();
        assert_eq!(logged, 1);
        let stats = StatsRepository::get(&mut conn, user_id).unwrap();
        assert_eq!((stats.new_words, stats.learning_words), (0, 1));
        assert_eq!(stats.review_streak, 1);
    }
}
