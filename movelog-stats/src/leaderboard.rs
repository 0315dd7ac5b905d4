//! Leaderboard tracker: top-N keywords per category with rank trends.
//!
//! The most recently published ranking lives in the cache under
//! `top_records_{category}` as `noun -> rank`. Each computation reads that
//! baseline, ranks the store's current counts, annotates trends against the
//! baseline and only then overwrites it.
//!
//! When the fresh ranking equals the published one, nothing is written and
//! trends are taken against the ranking that preceded it
//! (`top_records_prev_{category}`), so repeated reads without new records
//! return the same trends. A baseline with no predecessor key (one written
//! by another process or by hand) is its own predecessor.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cache::{StatsCache, keys};
use crate::error::Result;
use crate::store::EventStore;
use crate::types::{Category, KeywordRecord};

/// Direction of rank change since the previous computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Not in the previous ranking
    New,
    /// Moved to a better (smaller) rank
    Up,
    /// Moved to a worse (larger) rank
    Down,
    /// Rank unchanged
    Same,
}

impl Trend {
    /// Compare a fresh rank against the baseline rank, if any.
    #[must_use]
    pub fn between(previous: Option<i64>, current: i64) -> Self {
        match previous {
            None => Self::New,
            Some(prev) if current < prev => Self::Up,
            Some(prev) if current > prev => Self::Down,
            Some(_) => Self::Same,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Up => "up",
            Self::Down => "down",
            Self::Same => "same",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedKeyword {
    /// 1-based, smaller is better
    pub rank: i64,
    pub keyword: String,
    pub count: u64,
    pub trend: Trend,
}

/// Rank nouns by occurrence count.
///
/// Sorted by count descending, ties broken by ascending noun, then cut to
/// `size` entries.
pub fn rank_counts<'a>(
    records: impl IntoIterator<Item = &'a KeywordRecord>,
    size: usize,
) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for record in records {
        *counts.entry(record.noun.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(noun, count)| (noun.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(size);
    ranked
}

/// Annotate a fresh ranking with trends against `baseline`.
pub fn annotate(ranked: &[(String, u64)], baseline: &BTreeMap<String, i64>) -> Vec<RankedKeyword> {
    ranked
        .iter()
        .zip(1..)
        .map(|((keyword, count), rank)| RankedKeyword {
            rank,
            keyword: keyword.clone(),
            count: *count,
            trend: Trend::between(baseline.get(keyword).copied(), rank),
        })
        .collect()
}

/// The `noun -> rank` mapping stored as the next baseline.
pub fn baseline_of(ranked: &[(String, u64)]) -> Vec<(String, i64)> {
    ranked
        .iter()
        .zip(1..)
        .map(|((keyword, _), rank)| (keyword.clone(), rank))
        .collect()
}

/// Stands in for an empty previous ranking, which a hash cannot hold.
///
/// Real ranks start at 1, so readers drop any entry ranked below that.
const EMPTY_RANKING: (&str, i64) = ("", 0);

/// Maintains the per-category top-N and its cached baseline.
pub struct LeaderboardTracker {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn StatsCache>,
    size: usize,
}

impl LeaderboardTracker {
    /// Create a tracker publishing `size` entries per category.
    pub fn new(store: Arc<dyn EventStore>, cache: Arc<dyn StatsCache>, size: usize) -> Self {
        Self { store, cache, size }
    }

    /// Number of entries published per category.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current ranking from the store, without touching the baseline.
    #[instrument(skip(self), level = "debug")]
    pub async fn current_ranking(&self, category: Category) -> Result<Vec<(String, u64)>> {
        let records = self.store.all_records_for_category(category).await?;
        Ok(rank_counts(&records, self.size))
    }

    /// Compute the top-N with trends and publish it as the new baseline.
    ///
    /// The baseline is read before the new ranking is written, so trends
    /// always compare against the previous publication.
    #[instrument(skip(self), level = "debug")]
    pub async fn top_records(&self, category: Category) -> Result<Vec<RankedKeyword>> {
        let key = keys::top_records(category);
        let previous_key = keys::previous_top_records(category);

        let published = self.cache.read_mapping(&key).await?;
        let ranked = self.current_ranking(category).await?;
        let fresh = baseline_of(&ranked);

        let unchanged = fresh.len() == published.len()
            && fresh
                .iter()
                .all(|(noun, rank)| published.get(noun) == Some(rank));

        if unchanged {
            debug!(%category, "ranking unchanged, keeping baseline");
            // a baseline written without its predecessor compares against itself
            if !self.cache.exists(&previous_key).await? {
                return Ok(annotate(&ranked, &published));
            }
            let mut before = self.cache.read_mapping(&previous_key).await?;
            before.retain(|_, rank| *rank > 0);
            return Ok(annotate(&ranked, &before));
        }

        if published.is_empty() {
            debug!(%category, "no previous ranking, every entry is new");
        }
        let entries = annotate(&ranked, &published);

        let previous: Vec<(String, i64)> = if published.is_empty() {
            vec![(EMPTY_RANKING.0.to_string(), EMPTY_RANKING.1)]
        } else {
            published.into_iter().collect()
        };
        self.cache.write_mapping(&previous_key, &previous).await?;
        self.cache.write_mapping(&key, &fresh).await?;
        info!(%category, entries = entries.len(), "published leaderboard");

        Ok(entries)
    }
}
