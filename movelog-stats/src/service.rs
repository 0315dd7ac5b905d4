//! Facade the surrounding application talks to.
//!
//! A [`StatsService`] only exists after the startup backfill has finished,
//! so no query can observe a partially seeded cache.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::backfill::{BackfillJob, BackfillReport};
use crate::cache::StatsCache;
use crate::clock::Clock;
use crate::config::StatsConfig;
use crate::engine::{RecordStats, StatsEngine, TodayStatus};
use crate::error::{Error, Result};
use crate::keyword_stats::{KeywordStats, KeywordStatsCalculator};
use crate::leaderboard::{LeaderboardTracker, RankedKeyword};
use crate::recorder::ActionRecorder;
use crate::store::EventStore;
use crate::types::{Category, KeywordId, KeywordMatch, KeywordRecord, Period};

/// Readiness-gated entry point for stats queries and counter updates.
pub struct StatsService {
    engine: StatsEngine,
    leaderboard: LeaderboardTracker,
    recorder: ActionRecorder,
    keywords: KeywordStatsCalculator,
    backfill: BackfillReport,
}

impl StatsService {
    /// Run the backfill, then return a service ready to take queries.
    pub async fn initialize(
        store: Arc<dyn EventStore>,
        cache: Arc<dyn StatsCache>,
        clock: Arc<dyn Clock>,
        config: &StatsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let display_zone = config.display_offset().ok_or_else(|| {
            Error::Config(format!(
                "display_utc_offset_hours out of range: {}",
                config.stats.display_utc_offset_hours
            ))
        })?;
        let size = config.stats.leaderboard_size;

        let backfill = BackfillJob::new(store.clone(), cache.clone(), size)
            .run()
            .await?;

        let service = Self {
            engine: StatsEngine::new(store.clone(), cache.clone(), clock.clone(), display_zone),
            leaderboard: LeaderboardTracker::new(store.clone(), cache.clone(), size),
            recorder: ActionRecorder::new(cache),
            keywords: KeywordStatsCalculator::new(store, clock),
            backfill,
        };
        info!("stats service ready");
        Ok(service)
    }

    /// What the startup backfill wrote.
    pub fn backfill_report(&self) -> &BackfillReport {
        &self.backfill
    }

    /// Stats for wire-format `category`, `period` and optional `yyyy-MM` month.
    pub async fn get_stats(
        &self,
        category: &str,
        period: &str,
        month: Option<&str>,
    ) -> Result<RecordStats> {
        let category = Category::parse(category)?;
        let period = Period::parse(period)?;
        self.stats(category, period, month).await
    }

    /// Typed variant of [`get_stats`](Self::get_stats).
    #[instrument(skip(self), level = "debug")]
    pub async fn stats(
        &self,
        category: Category,
        period: Period,
        month: Option<&str>,
    ) -> Result<RecordStats> {
        // validate the month before any work or baseline write
        let daily_records = self.engine.calendar(category, period, month).await?;

        Ok(RecordStats {
            category,
            total_records: self.engine.total_records(category, period).await?,
            max_consecutive_days: self.engine.max_consecutive_days(category).await?,
            avg_daily_record: self.engine.avg_daily_record(category).await?,
            max_daily_record: self.engine.max_daily_record(category, period).await?,
            top_records: self.leaderboard.top_records(category).await?,
            daily_records,
        })
    }

    /// Leaderboard for wire-format `category`.
    pub async fn get_top_records(&self, category: &str) -> Result<Vec<RankedKeyword>> {
        let category = Category::parse(category)?;
        self.leaderboard.top_records(category).await
    }

    /// Count a newly persisted record into the cached counters.
    pub async fn record_action(&self, record: &KeywordRecord) -> Result<()> {
        self.recorder.record(record).await
    }

    /// Stats for `noun` across every user.
    pub async fn keyword_stats(&self, noun: &str) -> Result<KeywordStats> {
        self.keywords.for_noun(noun).await
    }

    /// Stats for one keyword.
    pub async fn keyword_stats_by_id(&self, id: KeywordId) -> Result<KeywordStats> {
        self.keywords.for_keyword(id).await
    }

    /// Nouns starting with `prefix`, most recorded first.
    pub async fn search_keywords(&self, prefix: &str) -> Result<Vec<KeywordMatch>> {
        self.keywords.search(prefix).await
    }

    /// Which categories `owner_id` has logged today.
    pub async fn today_status(&self, owner_id: i64) -> Result<TodayStatus> {
        self.engine.today_status(owner_id).await
    }
}
