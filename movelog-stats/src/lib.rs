//! Record statistics and ranking engine for movelog.
//!
//! Users log dated "verb + noun" actions. This crate derives aggregate
//! statistics from that append-only log: totals, streaks, daily and monthly
//! histograms, averages and a top-N leaderboard with rank trends.
//!
//! # Architecture
//!
//! - **Event store** ([`EventStore`]) is the source of truth, stored in libSQL
//! - **Cache** ([`StatsCache`]) holds per-period counters and the leaderboard
//!   baseline; it may be cold or lag behind the store
//! - **Engine** ([`StatsEngine`]) prefers the cache and falls back to a full
//!   store scan when a counter key is absent
//! - **Backfill** ([`BackfillJob`]) seeds the cache once at startup, before
//!   [`StatsService`] accepts queries

pub mod cache;
mod backfill;
mod clock;
mod config;
mod engine;
mod error;
mod histogram;
mod keyword_stats;
mod leaderboard;
mod recorder;
mod service;
pub mod store;
mod types;

// Error types
pub use error::{Error, Result};

// Configuration
pub use config::{CacheConfig, EngineConfig, StatsConfig, StoreConfig};

// Clock
pub use clock::{Clock, FixedClock, SystemClock};

// Domain types
pub use types::{
    ActionRecord, Category, Keyword, KeywordId, KeywordMatch, KeywordRecord, Period, RecordId,
};

// Storage and cache traits (re-exported from their modules)
pub use cache::{InMemoryStatsCache, RedisStatsCache, StatsCache};
pub use store::{EventStore, TursoEventStore};

// Components
pub use backfill::{BackfillJob, BackfillReport};
pub use engine::{RecordStats, StatsEngine, TodayStatus};
pub use keyword_stats::{KeywordStats, KeywordStatsCalculator};
pub use leaderboard::{LeaderboardTracker, RankedKeyword, Trend};
pub use recorder::ActionRecorder;
pub use service::StatsService;
