//! Turso/libSQL implementation of the event store.
//!
//! It can connect to:
//! - Remote Turso database (cloud)
//! - Local embedded SQLite file
//! - In-memory database (tests)

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database};
use tracing::{debug, instrument};

use super::EventStore;
use crate::error::{Error, Result};
use crate::types::{
    ActionRecord, Category, Keyword, KeywordId, KeywordMatch, KeywordRecord, RecordId,
};

/// SQL schema for the keywords table.
const SCHEMA_KEYWORDS: &str = r#"
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    noun TEXT NOT NULL,
    category TEXT NOT NULL,
    owner_id INTEGER NOT NULL
)
"#;

/// SQL schema for the records table.
const SCHEMA_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    action_time TEXT NOT NULL
)
"#;

const INDEX_KEYWORDS_CATEGORY: &str = r#"
CREATE INDEX IF NOT EXISTS idx_keywords_category
ON keywords(category)
"#;

const INDEX_RECORDS_KEYWORD_TIME: &str = r#"
CREATE INDEX IF NOT EXISTS idx_records_keyword_time
ON records(keyword_id, action_time)
"#;

/// Joined projection shared by every record query.
const SELECT_JOINED: &str = "SELECT r.id, r.keyword_id, k.noun, k.category, r.action_time \
     FROM records r JOIN keywords k ON k.id = r.keyword_id";

/// Turso-backed event store.
///
/// Holds a single connection so that an in-memory database is shared by
/// every query issued through clones of this handle.
#[derive(Clone)]
pub struct TursoEventStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoEventStore {
    /// Open (or create) a local embedded database.
    pub async fn new_local(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!("creating {}: {e}", parent.display()))
                })?;
            }
        }
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    /// Connect to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::from_database(db).await
    }

    /// Create a new in-memory store (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_KEYWORDS, ()).await?;
        self.conn.execute(SCHEMA_RECORDS, ()).await?;
        self.conn.execute(INDEX_KEYWORDS_CATEGORY, ()).await?;
        self.conn.execute(INDEX_RECORDS_KEYWORD_TIME, ()).await?;
        Ok(())
    }

    /// Register a keyword and return it with its assigned id.
    #[instrument(skip(self), level = "debug")]
    pub async fn insert_keyword(
        &self,
        noun: &str,
        category: Category,
        owner_id: i64,
    ) -> Result<Keyword> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO keywords (noun, category, owner_id) VALUES (?, ?, ?) RETURNING id",
                libsql::params![noun.to_string(), category.as_str(), owner_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| Error::InvalidData("insert returned no keyword id".into()))?;
        let id = KeywordId(row.get::<i64>(0)?);
        debug!(%id, noun, %category, "inserted keyword");

        Ok(Keyword {
            id,
            noun: noun.to_string(),
            category,
            owner_id,
        })
    }

    /// Append an action record for `keyword_id`.
    #[instrument(skip(self), level = "debug")]
    pub async fn insert_record(
        &self,
        keyword_id: KeywordId,
        timestamp: DateTime<Utc>,
    ) -> Result<ActionRecord> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO records (keyword_id, action_time) VALUES (?, ?) RETURNING id",
                libsql::params![keyword_id.0, format_datetime(timestamp)],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| Error::InvalidData("insert returned no record id".into()))?;

        Ok(ActionRecord {
            id: RecordId(row.get::<i64>(0)?),
            keyword_id,
            timestamp,
        })
    }

    /// Find a keyword by owner, noun and category.
    #[instrument(skip(self), level = "debug")]
    pub async fn find_keyword(
        &self,
        owner_id: i64,
        noun: &str,
        category: Category,
    ) -> Result<Option<Keyword>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, noun, category, owner_id FROM keywords WHERE owner_id = ? AND noun = ? AND category = ?",
                libsql::params![owner_id, noun.to_string(), category.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_keyword(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Run a joined record query and collect its rows.
    async fn query_records(
        &self,
        filter: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<KeywordRecord>> {
        let sql = format!("{SELECT_JOINED} {filter} ORDER BY r.action_time ASC, r.id ASC");
        let mut rows = self.conn.query(&sql, params).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    fn parse_keyword(row: &libsql::Row) -> Result<Keyword> {
        let id: i64 = row.get(0)?;
        let noun: String = row.get(1)?;
        let category_str: String = row.get(2)?;
        let owner_id: i64 = row.get(3)?;

        Ok(Keyword {
            id: KeywordId(id),
            noun,
            category: parse_category(&category_str)?,
            owner_id,
        })
    }

    fn parse_record(row: &libsql::Row) -> Result<KeywordRecord> {
        let record_id: i64 = row.get(0)?;
        let keyword_id: i64 = row.get(1)?;
        let noun: String = row.get(2)?;
        let category_str: String = row.get(3)?;
        let action_time: String = row.get(4)?;

        Ok(KeywordRecord {
            record_id: RecordId(record_id),
            keyword_id: KeywordId(keyword_id),
            noun,
            category: parse_category(&category_str)?,
            timestamp: parse_datetime(&action_time)?,
        })
    }
}

#[async_trait]
impl EventStore for TursoEventStore {
    #[instrument(skip(self), level = "debug")]
    async fn all_records_for_category(&self, category: Category) -> Result<Vec<KeywordRecord>> {
        self.query_records("WHERE k.category = ?", [category.as_str()])
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn records_in_range(
        &self,
        category: Category,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<KeywordRecord>> {
        self.query_records(
            "WHERE k.category = ? AND r.action_time >= ? AND r.action_time < ?",
            libsql::params![category.as_str(), format_datetime(start), format_datetime(end)],
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn all_records(&self) -> Result<Vec<KeywordRecord>> {
        self.query_records("", ()).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn keyword(&self, id: KeywordId) -> Result<Option<Keyword>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, noun, category, owner_id FROM keywords WHERE id = ?",
                [id.0],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_keyword(&row)?))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn records_for_noun(&self, noun: &str) -> Result<Vec<KeywordRecord>> {
        self.query_records("WHERE k.noun = ?", [noun.to_string()])
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn records_for_keyword(&self, id: KeywordId) -> Result<Vec<KeywordRecord>> {
        self.query_records("WHERE r.keyword_id = ?", [id.0]).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn search_nouns(&self, prefix: &str) -> Result<Vec<KeywordMatch>> {
        let pattern = format!("{}%", escape_like(prefix));
        let mut rows = self
            .conn
            .query(
                "SELECT MIN(k.id), k.noun, COUNT(r.id) FROM keywords k \
                 LEFT JOIN records r ON r.keyword_id = k.id \
                 WHERE LOWER(k.noun) LIKE LOWER(?) ESCAPE '\\' \
                 GROUP BY k.noun \
                 ORDER BY COUNT(r.id) DESC, k.noun ASC",
                [pattern],
            )
            .await?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            let keyword_id: i64 = row.get(0)?;
            let noun: String = row.get(1)?;
            let count: i64 = row.get(2)?;
            matches.push(KeywordMatch {
                keyword_id: KeywordId(keyword_id),
                noun,
                count: count.max(0) as u64,
            });
        }
        debug!(prefix, matches = matches.len(), "searched nouns");
        Ok(matches)
    }

    #[instrument(skip(self), level = "debug")]
    async fn categories_recorded(
        &self,
        owner_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Category>> {
        let mut rows = self
            .conn
            .query(
                "SELECT DISTINCT k.category FROM records r \
                 JOIN keywords k ON k.id = r.keyword_id \
                 WHERE k.owner_id = ? AND r.action_time >= ? AND r.action_time < ?",
                libsql::params![owner_id, format_datetime(start), format_datetime(end)],
            )
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            let category: String = row.get(0)?;
            categories.push(parse_category(&category)?);
        }
        Ok(categories)
    }
}

/// Format a datetime for storage.
///
/// Fixed-width UTC text, so string comparison orders chronologically.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime from storage.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidData(format!("invalid datetime: {}", s)))
}

/// Escape `LIKE` wildcards so `s` matches literally (escape char `\`).
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_category(s: &str) -> Result<Category> {
    Category::parse(s).map_err(|_| Error::InvalidData(format!("invalid category: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn create_test_store() -> TursoEventStore {
        TursoEventStore::new_memory().await.unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn store_returns_empty_list_when_no_records() {
        let store = create_test_store().await;

        let records = store.all_records_for_category(Category::Do).await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn store_returns_none_for_nonexistent_keyword() {
        let store = create_test_store().await;

        assert!(store.keyword(KeywordId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_keyword_assigns_ids() {
        let store = create_test_store().await;

        let first = store.insert_keyword("running", Category::Do, 1).await.unwrap();
        let second = store.insert_keyword("ramen", Category::Eat, 1).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.keyword(second.id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn records_are_joined_with_their_keyword() {
        let store = create_test_store().await;
        let keyword = store.insert_keyword("climbing", Category::Go, 7).await.unwrap();
        let record = store.insert_record(keyword.id, at(2025, 1, 2, 8)).await.unwrap();

        let records = store.all_records_for_category(Category::Go).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, record.id);
        assert_eq!(records[0].noun, "climbing");
        assert_eq!(records[0].category, Category::Go);
        assert_eq!(records[0].timestamp, at(2025, 1, 2, 8));
    }

    #[tokio::test]
    async fn category_filter_excludes_other_categories() {
        let store = create_test_store().await;
        let run = store.insert_keyword("running", Category::Do, 1).await.unwrap();
        let ramen = store.insert_keyword("ramen", Category::Eat, 1).await.unwrap();
        store.insert_record(run.id, at(2025, 1, 1, 9)).await.unwrap();
        store.insert_record(ramen.id, at(2025, 1, 1, 12)).await.unwrap();
        store.insert_record(ramen.id, at(2025, 1, 2, 12)).await.unwrap();

        assert_eq!(store.all_records_for_category(Category::Do).await.unwrap().len(), 1);
        assert_eq!(store.all_records_for_category(Category::Eat).await.unwrap().len(), 2);
        assert_eq!(store.all_records().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn range_query_is_half_open() {
        let store = create_test_store().await;
        let keyword = store.insert_keyword("running", Category::Do, 1).await.unwrap();
        store.insert_record(keyword.id, at(2025, 1, 31, 23)).await.unwrap();
        store.insert_record(keyword.id, at(2025, 2, 1, 0)).await.unwrap();
        store.insert_record(keyword.id, at(2025, 2, 28, 23)).await.unwrap();
        store.insert_record(keyword.id, at(2025, 3, 1, 0)).await.unwrap();

        let february = store
            .records_in_range(Category::Do, at(2025, 2, 1, 0), at(2025, 3, 1, 0))
            .await
            .unwrap();

        assert_eq!(february.len(), 2);
        assert_eq!(february[0].timestamp, at(2025, 2, 1, 0));
        assert_eq!(february[1].timestamp, at(2025, 2, 28, 23));
    }

    #[tokio::test]
    async fn records_are_ordered_by_timestamp() {
        let store = create_test_store().await;
        let keyword = store.insert_keyword("running", Category::Do, 1).await.unwrap();
        store.insert_record(keyword.id, at(2025, 3, 1, 0)).await.unwrap();
        store.insert_record(keyword.id, at(2025, 1, 1, 0)).await.unwrap();

        let records = store.records_for_keyword(keyword.id).await.unwrap();

        assert_eq!(records[0].timestamp, at(2025, 1, 1, 0));
        assert_eq!(records[1].timestamp, at(2025, 3, 1, 0));
    }

    #[tokio::test]
    async fn records_for_noun_spans_users() {
        let store = create_test_store().await;
        let mine = store.insert_keyword("yoga", Category::Do, 1).await.unwrap();
        let theirs = store.insert_keyword("yoga", Category::Do, 2).await.unwrap();
        let other = store.insert_keyword("tennis", Category::Do, 2).await.unwrap();
        store.insert_record(mine.id, at(2025, 1, 1, 0)).await.unwrap();
        store.insert_record(theirs.id, at(2025, 1, 2, 0)).await.unwrap();
        store.insert_record(other.id, at(2025, 1, 3, 0)).await.unwrap();

        assert_eq!(store.records_for_noun("yoga").await.unwrap().len(), 2);
        assert_eq!(store.records_for_keyword(mine.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_keyword_matches_owner_noun_and_category() {
        let store = create_test_store().await;
        let keyword = store.insert_keyword("sushi", Category::Eat, 3).await.unwrap();

        assert_eq!(
            store.find_keyword(3, "sushi", Category::Eat).await.unwrap(),
            Some(keyword)
        );
        assert!(store.find_keyword(4, "sushi", Category::Eat).await.unwrap().is_none());
        assert!(store.find_keyword(3, "sushi", Category::Do).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("movelog.db");

        {
            let store = TursoEventStore::new_local(&path).await.unwrap();
            let keyword = store.insert_keyword("running", Category::Do, 1).await.unwrap();
            store.insert_record(keyword.id, at(2025, 1, 1, 0)).await.unwrap();
        }

        let reopened = TursoEventStore::new_local(&path).await.unwrap();
        assert_eq!(reopened.all_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_nouns_groups_by_noun_and_orders_by_count() {
        let store = create_test_store().await;
        let mine = store.insert_keyword("Running", Category::Do, 1).await.unwrap();
        let theirs = store.insert_keyword("Running", Category::Do, 2).await.unwrap();
        let rugby = store.insert_keyword("rugby", Category::Do, 1).await.unwrap();
        let rumba = store.insert_keyword("rumba", Category::Do, 1).await.unwrap();
        store.insert_keyword("ramen", Category::Eat, 1).await.unwrap();
        for id in [mine.id, theirs.id, rugby.id, rumba.id] {
            store.insert_record(id, at(2025, 1, 1, 9)).await.unwrap();
        }

        let matches = store.search_nouns("RU").await.unwrap();

        let summary: Vec<_> = matches
            .iter()
            .map(|m| (m.keyword_id, m.noun.as_str(), m.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                (mine.id, "Running", 2),
                (rugby.id, "rugby", 1),
                (rumba.id, "rumba", 1),
            ]
        );
    }

    #[tokio::test]
    async fn search_nouns_includes_unrecorded_and_escapes_wildcards() {
        let store = create_test_store().await;
        store.insert_keyword("50% run", Category::Do, 1).await.unwrap();
        store.insert_keyword("500m swim", Category::Do, 1).await.unwrap();

        let matches = store.search_nouns("50%").await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].noun, "50% run");
        assert_eq!(matches[0].count, 0);
        assert!(store.search_nouns("5_0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn categories_recorded_is_scoped_to_owner_and_window() {
        let store = create_test_store().await;
        let run = store.insert_keyword("running", Category::Do, 1).await.unwrap();
        let ramen = store.insert_keyword("ramen", Category::Eat, 1).await.unwrap();
        let park = store.insert_keyword("park", Category::Go, 2).await.unwrap();
        store.insert_record(run.id, at(2025, 1, 2, 8)).await.unwrap();
        store.insert_record(run.id, at(2025, 1, 2, 9)).await.unwrap();
        store.insert_record(ramen.id, at(2025, 1, 3, 12)).await.unwrap();
        store.insert_record(park.id, at(2025, 1, 2, 10)).await.unwrap();

        let categories = store
            .categories_recorded(1, at(2025, 1, 2, 0), at(2025, 1, 3, 0))
            .await
            .unwrap();

        assert_eq!(categories, vec![Category::Do]);
    }

    #[test]
    fn formatted_datetimes_sort_chronologically() {
        let early = format_datetime(at(2025, 1, 9, 0));
        let late = format_datetime(at(2025, 1, 10, 0));

        assert!(early < late);
        assert_eq!(parse_datetime(&early).unwrap(), at(2025, 1, 9, 0));
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(Error::InvalidData(_))
        ));
    }
}
