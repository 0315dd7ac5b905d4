//! Event store: the authoritative, append-only log of recorded actions.
//!
//! - [`EventStore`] - Read-only queries the engine aggregates over
//! - [`TursoEventStore`] - libSQL implementation, also exposing the write
//!   helpers the surrounding application uses to append records
//!
//! Every query returns [`KeywordRecord`]s, i.e. records already joined with
//! their keyword, ordered by timestamp.

mod turso;

pub use turso::TursoEventStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Category, Keyword, KeywordId, KeywordMatch, KeywordRecord};

/// Read-only queries against the event log.
///
/// Any failure to reach the backing database surfaces as
/// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable); there is no
/// fallback below the store.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every record whose keyword belongs to `category`.
    async fn all_records_for_category(&self, category: Category) -> Result<Vec<KeywordRecord>>;

    /// Records of `category` with `start <= timestamp < end`.
    async fn records_in_range(
        &self,
        category: Category,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<KeywordRecord>>;

    /// Every record in the store, across categories.
    async fn all_records(&self) -> Result<Vec<KeywordRecord>>;

    /// Look up a keyword by id.
    async fn keyword(&self, id: KeywordId) -> Result<Option<Keyword>>;

    /// Records for every keyword named `noun`, across users and categories.
    async fn records_for_noun(&self, noun: &str) -> Result<Vec<KeywordRecord>>;

    /// Records for a single keyword.
    async fn records_for_keyword(&self, id: KeywordId) -> Result<Vec<KeywordRecord>>;

    /// Nouns starting with `prefix`, ignoring ASCII case, one entry per noun.
    ///
    /// Ordered by record count descending, ties by ascending noun.
    async fn search_nouns(&self, prefix: &str) -> Result<Vec<KeywordMatch>>;

    /// Distinct categories `owner_id` recorded with `start <= timestamp < end`.
    async fn categories_recorded(
        &self,
        owner_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Category>>;
}
