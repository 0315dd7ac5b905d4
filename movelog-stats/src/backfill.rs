//! One-shot startup job that seeds the cache from the event store.
//!
//! Two things are written:
//!
//! - The leaderboard baseline `top_records_{category}` (and its predecessor
//!   `top_records_prev_{category}`), only for categories whose baseline key
//!   is absent. An existing baseline is never touched.
//! - Every daily, weekly, monthly and total counter. Counts are recomputed
//!   from a full scan and each key is replaced whole, so running the job
//!   again after a partial failure converges instead of double counting.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cache::{StatsCache, keys};
use crate::error::Result;
use crate::leaderboard;
use crate::store::EventStore;
use crate::types::{Category, KeywordRecord};

/// What a backfill run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Records read from the store
    pub records_scanned: usize,
    /// Categories whose leaderboard baseline was seeded
    pub baselines_seeded: Vec<Category>,
    /// Counter keys rewritten
    pub counters_written: usize,
}

/// Seeds counters and leaderboard baselines from the event store.
pub struct BackfillJob {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn StatsCache>,
    leaderboard_size: usize,
}

impl BackfillJob {
    pub fn new(
        store: Arc<dyn EventStore>,
        cache: Arc<dyn StatsCache>,
        leaderboard_size: usize,
    ) -> Self {
        Self {
            store,
            cache,
            leaderboard_size,
        }
    }

    /// Run the job to completion.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self) -> Result<BackfillReport> {
        info!("starting cache backfill");
        let records = self.store.all_records().await?;
        let mut report = BackfillReport {
            records_scanned: records.len(),
            ..BackfillReport::default()
        };

        for category in Category::ALL {
            if self.seed_baseline(category, &records).await? {
                report.baselines_seeded.push(category);
            }
        }

        let counters = counter_totals(&records);
        for (key, members) in &counters {
            let scores: Vec<(String, i64)> = members
                .iter()
                .map(|(noun, count)| (noun.to_string(), *count))
                .collect();
            self.cache.replace_scores(key, &scores).await?;
        }
        report.counters_written = counters.len();

        info!(
            records = report.records_scanned,
            counters = report.counters_written,
            baselines = report.baselines_seeded.len(),
            "cache backfill complete"
        );
        Ok(report)
    }

    /// Seed the baseline for `category` if absent. Returns whether it wrote.
    async fn seed_baseline(&self, category: Category, records: &[KeywordRecord]) -> Result<bool> {
        let key = keys::top_records(category);
        if self.cache.exists(&key).await? {
            debug!(%category, "leaderboard baseline present, leaving it");
            return Ok(false);
        }

        let ranked = leaderboard::rank_counts(
            records.iter().filter(|r| r.category == category),
            self.leaderboard_size,
        );
        let baseline = leaderboard::baseline_of(&ranked);
        // a seeded ranking has no history: it is its own predecessor
        self.cache
            .write_mapping(&keys::previous_top_records(category), &baseline)
            .await?;
        self.cache.write_mapping(&key, &baseline).await?;
        info!(%category, entries = baseline.len(), "seeded leaderboard baseline");
        Ok(true)
    }
}

/// Count every record into each counter key it belongs to.
fn counter_totals(records: &[KeywordRecord]) -> BTreeMap<String, HashMap<&str, i64>> {
    let mut counters: BTreeMap<String, HashMap<&str, i64>> = BTreeMap::new();
    for record in records {
        for key in keys::counters_for(record.category, record.date()) {
            *counters
                .entry(key)
                .or_default()
                .entry(record.noun.as_str())
                .or_insert(0) += 1;
        }
    }
    counters
}
