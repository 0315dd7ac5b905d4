//! Aggregation engine: totals, streaks, averages and date histograms.
//!
//! Counter reads go to the cache first. An absent counter key is the normal
//! "cache cold" state and triggers a scan of the event store; the recomputed
//! value is returned but never written back, so only the backfill job and the
//! recorder ever write counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::{StatsCache, keys};
use crate::clock::Clock;
use crate::error::Result;
use crate::histogram::{self, DailyHistogram, DateWindow};
use crate::leaderboard::RankedKeyword;
use crate::store::EventStore;
use crate::types::{Category, KeywordRecord, Period};

/// Everything the stats view shows for one category and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStats {
    pub category: Category,
    pub total_records: u64,
    pub max_consecutive_days: u32,
    pub avg_daily_record: f64,
    pub max_daily_record: u64,
    pub top_records: Vec<RankedKeyword>,
    /// Calendar counts, keyed by date
    pub daily_records: BTreeMap<NaiveDate, u64>,
}

/// Which categories a user has logged today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    pub is_do: bool,
    pub is_eat: bool,
    pub is_go: bool,
}

impl TodayStatus {
    /// Status with every category in `categories` marked.
    pub fn from_categories(categories: &[Category]) -> Self {
        Self {
            is_do: categories.contains(&Category::Do),
            is_eat: categories.contains(&Category::Eat),
            is_go: categories.contains(&Category::Go),
        }
    }

    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::Do => self.is_do,
            Category::Eat => self.is_eat,
            Category::Go => self.is_go,
        }
    }
}

/// Computes aggregates, preferring cached counters over store scans.
pub struct StatsEngine {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn StatsCache>,
    clock: Arc<dyn Clock>,
    display_zone: FixedOffset,
}

impl StatsEngine {
    /// Create a new engine. `display_zone` is used by the monthly histogram.
    pub fn new(
        store: Arc<dyn EventStore>,
        cache: Arc<dyn StatsCache>,
        clock: Arc<dyn Clock>,
        display_zone: FixedOffset,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            display_zone,
        }
    }

    /// Today's date in the store's zone.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Today's date in the display zone.
    pub fn local_today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.display_zone).date_naive()
    }

    /// Categories `owner_id` has a record in on the display zone's today.
    #[instrument(skip(self), level = "debug")]
    pub async fn today_status(&self, owner_id: i64) -> Result<TodayStatus> {
        let (start, end) = DateWindow::day(self.local_today()).bounds_in(self.display_zone);
        let categories = self.store.categories_recorded(owner_id, start, end).await?;
        Ok(TodayStatus::from_categories(&categories))
    }

    /// Number of records of `category` in `period`.
    ///
    /// Served from the period's counter key when present, otherwise by
    /// counting matching records in the store.
    #[instrument(skip(self), level = "debug")]
    pub async fn total_records(&self, category: Category, period: Period) -> Result<u64> {
        let today = self.today();
        let key = keys::for_period(category, period, today);

        if let Some(scores) = self.cache.read_scores(&key).await? {
            let total: u64 = scores.iter().map(|(_, s)| (*s).max(0) as u64).sum();
            debug!(key = %key, total, "total served from cache");
            return Ok(total);
        }

        warn!(key = %key, "counter key absent, counting from event store");
        let records = self.records_in_period(category, period, today).await?;
        Ok(records.len() as u64)
    }

    /// Longest run of consecutive days with at least one record.
    #[instrument(skip(self), level = "debug")]
    pub async fn max_consecutive_days(&self, category: Category) -> Result<u32> {
        let records = self.store.all_records_for_category(category).await?;
        Ok(histogram::longest_streak(records.iter().map(KeywordRecord::date)))
    }

    /// Mean records per active day, two decimals half-up.
    #[instrument(skip(self), level = "debug")]
    pub async fn avg_daily_record(&self, category: Category) -> Result<f64> {
        let histogram = self.daily_histogram(category).await?;
        Ok(histogram::average_per_day(&histogram))
    }

    /// Largest single-day count within `period`.
    ///
    /// When the period's counter key exists, the maximum is taken over the
    /// cached daily buckets the period covers (missing buckets count as 0).
    /// `total`, or a cold period key, falls back to the store histogram.
    #[instrument(skip(self), level = "debug")]
    pub async fn max_daily_record(&self, category: Category, period: Period) -> Result<u64> {
        let today = self.today();

        if let Some(window) = DateWindow::for_period(period, today) {
            let key = keys::for_period(category, period, today);
            if self.cache.snapshot_size(&key).await?.is_some() {
                let mut max = 0;
                for day in window.days() {
                    let day_key = keys::daily(category, day);
                    let count: u64 = match self.cache.read_scores(&day_key).await? {
                        Some(scores) => scores.iter().map(|(_, s)| (*s).max(0) as u64).sum(),
                        None => 0,
                    };
                    max = max.max(count);
                }
                debug!(key = %key, max, "max daily record served from cache");
                return Ok(max);
            }
            warn!(key = %key, "counter key absent, computing max from event store");
        }

        let records = self.records_in_period(category, period, today).await?;
        Ok(histogram::max_per_day(&histogram::daily_counts(&records)))
    }

    /// All-time per-date counts, bucketed by UTC date.
    #[instrument(skip(self), level = "debug")]
    pub async fn daily_histogram(&self, category: Category) -> Result<DailyHistogram> {
        let records = self.store.all_records_for_category(category).await?;
        Ok(histogram::daily_counts(&records))
    }

    /// Per-date counts for one calendar month, bucketed in the display zone.
    ///
    /// `month` is `yyyy-MM`; when absent or blank the current month is used.
    /// Records are selected by the month's UTC bounds and then shifted into
    /// the display zone before bucketing, so a record late on the last UTC
    /// day of the month may appear under the 1st of the next month.
    #[instrument(skip(self), level = "debug")]
    pub async fn monthly_histogram(
        &self,
        category: Category,
        month: Option<&str>,
    ) -> Result<DailyHistogram> {
        let first = match month.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => histogram::parse_month(m)?,
            None => {
                let today = self.today();
                today.with_day(1).unwrap_or(today)
            }
        };

        let (start, end) = DateWindow::month(first).utc_bounds();
        let records = self.store.records_in_range(category, start, end).await?;
        debug!(%first, records = records.len(), "fetched month");
        Ok(histogram::daily_counts_in_zone(&records, self.display_zone))
    }

    /// The calendar view for a stats request.
    pub async fn calendar(
        &self,
        category: Category,
        period: Period,
        month: Option<&str>,
    ) -> Result<DailyHistogram> {
        match period {
            Period::Monthly => self.monthly_histogram(category, month).await,
            _ => self.daily_histogram(category).await,
        }
    }

    async fn records_in_period(
        &self,
        category: Category,
        period: Period,
        today: NaiveDate,
    ) -> Result<Vec<KeywordRecord>> {
        match DateWindow::for_period(period, today) {
            Some(window) => {
                let (start, end) = window.utc_bounds();
                self.store.records_in_range(category, start, end).await
            }
            None => self.store.all_records_for_category(category).await,
        }
    }
}
