//! Incremental cache: per-period counters and the leaderboard baseline.
//!
//! Counters are sorted sets (member = noun, score = occurrences) and the
//! baseline is a hash (member = noun, value = rank). The cache may be cold or
//! lag behind the event store; an absent key is reported as `None`, never as
//! an error, so callers can fall back to the store.
//!
//! - [`InMemoryStatsCache`] - Process-local cache for tests and single-node use
//! - [`RedisStatsCache`] - Shared Redis cache

pub mod keys;
mod memory;
mod redis_cache;

pub use memory::InMemoryStatsCache;
pub use redis_cache::RedisStatsCache;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;

/// Sorted-set counters and hash mappings, atomic per key.
///
/// No operation spans keys; a record that bumps both a daily and a total
/// counter does so with two independent calls.
#[async_trait]
pub trait StatsCache: Send + Sync {
    /// Atomically add `delta` to `member` under `key`, creating either if
    /// absent. Returns the new score.
    async fn increment(&self, key: &str, member: &str, delta: i64) -> Result<i64>;

    /// Number of members under `key`, or `None` if the key does not exist.
    async fn snapshot_size(&self, key: &str) -> Result<Option<u64>>;

    /// All `(member, score)` pairs under `key`, highest score first with
    /// ties in ascending member order, or `None` if the key does not exist.
    async fn read_scores(&self, key: &str) -> Result<Option<Vec<(String, i64)>>>;

    /// Atomically replace the whole counter set under `key`.
    ///
    /// An empty `scores` leaves the key absent.
    async fn replace_scores(&self, key: &str, scores: &[(String, i64)]) -> Result<()>;

    /// Whether `key` exists, whatever its type.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// The hash under `key`; empty if absent.
    async fn read_mapping(&self, key: &str) -> Result<BTreeMap<String, i64>>;

    /// Atomically overwrite the hash under `key`.
    async fn write_mapping(&self, key: &str, mapping: &[(String, i64)]) -> Result<()>;
}
