//! Redis implementation of [`StatsCache`].
//!
//! Counters are Redis sorted sets driven by `ZINCRBY`, the leaderboard
//! baseline is a Redis hash. Whole-key replacements run as `MULTI`/`EXEC`
//! pipelines so readers never observe a half-written key.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::{info, instrument, warn};

use super::StatsCache;
use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// Redis-backed cache shared by every process that talks to the same server.
#[derive(Clone)]
pub struct RedisStatsCache {
    conn: ConnectionManager,
}

impl RedisStatsCache {
    /// Connect using the URL and connection settings in `config`.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| Error::Config("cache.redis_url is not set".into()))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.retries)
            .set_connection_timeout(config.connection_timeout);

        let client = Client::open(url)?;
        let conn = client
            .get_connection_manager_with_config(manager_config)
            .await?;
        info!("connected to redis cache");

        Ok(Self { conn })
    }

    /// Wrap an existing connection manager.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl StatsCache for RedisStatsCache {
    #[instrument(skip(self), level = "debug")]
    async fn increment(&self, key: &str, member: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let score: f64 = conn.zincr(key, member, delta).await?;
        Ok(score.round() as i64)
    }

    #[instrument(skip(self), level = "debug")]
    async fn snapshot_size(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        // ZCARD reports 0 for a missing key; only EXISTS tells the two apart
        let exists: bool = conn.exists(key).await?;
        if !exists {
            return Ok(None);
        }
        let size: u64 = conn.zcard(key).await?;
        Ok(Some(size))
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_scores(&self, key: &str) -> Result<Option<Vec<(String, i64)>>> {
        let mut conn = self.conn.clone();
        let raw: Vec<(String, f64)> = conn.zrevrange_withscores(key, 0, -1).await?;
        // Redis deletes a sorted set once its last member is gone
        if raw.is_empty() {
            return Ok(None);
        }
        let mut scores: Vec<(String, i64)> = raw
            .into_iter()
            .map(|(member, score)| (member, score.round() as i64))
            .collect();
        // ZREVRANGE breaks ties in descending member order
        scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(Some(scores))
    }

    #[instrument(skip(self, scores), level = "debug", fields(members = scores.len()))]
    async fn replace_scores(&self, key: &str, scores: &[(String, i64)]) -> Result<()> {
        let mut conn = self.conn.clone();
        let items: Vec<(i64, &str)> = scores.iter().map(|(m, s)| (*s, m.as_str())).collect();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !items.is_empty() {
            pipe.zadd_multiple(key, &items).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_mapping(&self, key: &str) -> Result<BTreeMap<String, i64>> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(key).await?;

        let mut mapping = BTreeMap::new();
        for (member, value) in raw {
            match value.trim().parse::<i64>() {
                Ok(rank) => {
                    mapping.insert(member, rank);
                }
                Err(_) => {
                    warn!(key, member = %member, value = %value, "skipping unparsable mapping entry")
                }
            }
        }
        Ok(mapping)
    }

    #[instrument(skip(self, mapping), level = "debug", fields(entries = mapping.len()))]
    async fn write_mapping(&self, key: &str, mapping: &[(String, i64)]) -> Result<()> {
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !mapping.is_empty() {
            pipe.hset_multiple(key, mapping).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_a_url() {
        let err = RedisStatsCache::connect(&CacheConfig::default())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let config = CacheConfig {
            redis_url: Some("not a url".into()),
            ..CacheConfig::default()
        };

        let err = RedisStatsCache::connect(&config).await.err().unwrap();

        assert!(matches!(err, Error::Cache(_)));
    }
}
