//! Per-keyword statistics, across all users or for a single keyword, and
//! the prefix search the stats view uses to pick a keyword.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::histogram;
use crate::store::EventStore;
use crate::types::{KeywordId, KeywordMatch, KeywordRecord};

/// Usage summary of one noun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStats {
    pub noun: String,
    pub count: u64,
    pub last_recorded_at: Option<DateTime<Utc>>,
    /// Records per active day
    pub avg_daily_record: f64,
    /// Records in the trailing 7 days, per day
    pub avg_weekly_record: f64,
}

/// Computes [`KeywordStats`] straight from the event store.
pub struct KeywordStatsCalculator {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl KeywordStatsCalculator {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stats for `noun` across every user's keyword of that name.
    #[instrument(skip(self), level = "debug")]
    pub async fn for_noun(&self, noun: &str) -> Result<KeywordStats> {
        let noun = noun.trim();
        if noun.is_empty() {
            return Err(Error::InvalidArgument("keyword must not be empty".into()));
        }
        let records = self.store.records_for_noun(noun).await?;
        Ok(self.summarize(noun, &records))
    }

    /// Stats for one keyword; `NotFound` if it does not exist.
    #[instrument(skip(self), level = "debug")]
    pub async fn for_keyword(&self, id: KeywordId) -> Result<KeywordStats> {
        let keyword = self
            .store
            .keyword(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("keyword {id}")))?;
        let records = self.store.records_for_keyword(id).await?;
        Ok(self.summarize(&keyword.noun, &records))
    }

    /// Nouns starting with `prefix`, most recorded first.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, prefix: &str) -> Result<Vec<KeywordMatch>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::InvalidArgument("search term must not be empty".into()));
        }
        self.store.search_nouns(prefix).await
    }

    fn summarize(&self, noun: &str, records: &[KeywordRecord]) -> KeywordStats {
        let week_ago = self.clock.now() - Duration::days(7);
        let recent = records.iter().filter(|r| r.timestamp > week_ago).count() as u64;

        KeywordStats {
            noun: noun.to_string(),
            count: records.len() as u64,
            last_recorded_at: records.iter().map(|r| r.timestamp).max(),
            avg_daily_record: histogram::average_per_day(&histogram::daily_counts(records)),
            avg_weekly_record: histogram::ratio_half_up(recent, 7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::TursoEventStore;
    use crate::types::Category;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, h, 0, 0).unwrap()
    }

    async fn fixture() -> (Arc<TursoEventStore>, KeywordStatsCalculator) {
        let store = Arc::new(TursoEventStore::new_memory().await.unwrap());
        let clock = Arc::new(FixedClock(at(20, 12)));
        let calculator = KeywordStatsCalculator::new(store.clone(), clock);
        (store, calculator)
    }

    #[tokio::test]
    async fn noun_stats_span_every_owner() {
        let (store, calculator) = fixture().await;
        let mine = store.insert_keyword("yoga", Category::Do, 1).await.unwrap();
        let theirs = store.insert_keyword("yoga", Category::Do, 2).await.unwrap();
        // 3 records on the 1st, 1 on the 15th, 1 on the 19th
        for (id, ts) in [
            (mine.id, at(1, 8)),
            (mine.id, at(1, 9)),
            (theirs.id, at(1, 10)),
            (theirs.id, at(15, 10)),
            (mine.id, at(19, 7)),
        ] {
            store.insert_record(id, ts).await.unwrap();
        }

        let stats = calculator.for_noun(" yoga ").await.unwrap();

        assert_eq!(stats.noun, "yoga");
        assert_eq!(stats.count, 5);
        assert_eq!(stats.last_recorded_at, Some(at(19, 7)));
        assert_eq!(stats.avg_daily_record, 1.67);
        // 2 records after 2025-01-13T12:00
        assert_eq!(stats.avg_weekly_record, 0.29);
    }

    #[tokio::test]
    async fn unknown_noun_has_empty_stats() {
        let (_store, calculator) = fixture().await;

        let stats = calculator.for_noun("skydiving").await.unwrap();

        assert_eq!(stats.count, 0);
        assert_eq!(stats.last_recorded_at, None);
        assert_eq!(stats.avg_daily_record, 0.0);
        assert_eq!(stats.avg_weekly_record, 0.0);
    }

    #[tokio::test]
    async fn empty_noun_is_rejected() {
        let (_store, calculator) = fixture().await;

        let err = calculator.for_noun("  ").await.unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn keyword_stats_are_scoped_to_one_keyword() {
        let (store, calculator) = fixture().await;
        let mine = store.insert_keyword("tennis", Category::Do, 1).await.unwrap();
        let theirs = store.insert_keyword("tennis", Category::Do, 2).await.unwrap();
        store.insert_record(mine.id, at(18, 9)).await.unwrap();
        store.insert_record(theirs.id, at(18, 9)).await.unwrap();
        store.insert_record(theirs.id, at(19, 9)).await.unwrap();

        let stats = calculator.for_keyword(mine.id).await.unwrap();

        assert_eq!(stats.count, 1);
        assert_eq!(stats.avg_daily_record, 1.0);
        assert_eq!(stats.avg_weekly_record, 0.14);
    }

    #[tokio::test]
    async fn search_orders_matches_by_record_count() {
        let (store, calculator) = fixture().await;
        let swim = store.insert_keyword("swimming", Category::Do, 1).await.unwrap();
        let sushi = store.insert_keyword("sushi", Category::Eat, 2).await.unwrap();
        store.insert_keyword("squash", Category::Do, 1).await.unwrap();
        store.insert_record(swim.id, at(3, 9)).await.unwrap();
        for d in [4, 5, 6] {
            store.insert_record(sushi.id, at(d, 12)).await.unwrap();
        }

        let matches = calculator.search(" su ").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].keyword_id, sushi.id);

        let nouns: Vec<_> = calculator
            .search("s")
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.noun, m.count))
            .collect();
        assert_eq!(
            nouns,
            vec![
                ("sushi".to_string(), 3),
                ("swimming".to_string(), 1),
                ("squash".to_string(), 0),
            ]
        );
    }

    #[tokio::test]
    async fn blank_search_is_rejected() {
        let (_store, calculator) = fixture().await;

        let err = calculator.search("").await.unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_keyword_is_not_found() {
        let (_store, calculator) = fixture().await;

        let err = calculator.for_keyword(KeywordId(99)).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }
}
