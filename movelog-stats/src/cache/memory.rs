//! In-process [`StatsCache`] implementation.
//!
//! Stores counters and mappings in memory without persistence. Every
//! operation takes the write lock for its duration, so single-key operations
//! are atomic with respect to each other.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StatsCache;
use crate::error::Result;

#[derive(Default)]
struct State {
    /// Sorted-set keys
    scores: HashMap<String, HashMap<String, i64>>,
    /// Hash keys
    mappings: HashMap<String, BTreeMap<String, i64>>,
}

/// In-memory implementation of [`StatsCache`].
#[derive(Default)]
pub struct InMemoryStatsCache {
    state: RwLock<State>,
}

impl InMemoryStatsCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held, of either kind.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state.scores.len() + state.mappings.len()
    }

    /// Check if the cache holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every key.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.scores.clear();
        state.mappings.clear();
    }
}

#[async_trait]
impl StatsCache for InMemoryStatsCache {
    async fn increment(&self, key: &str, member: &str, delta: i64) -> Result<i64> {
        let mut state = self.state.write().await;
        let score = state
            .scores
            .entry(key.to_string())
            .or_default()
            .entry(member.to_string())
            .or_insert(0);
        *score += delta;
        Ok(*score)
    }

    async fn snapshot_size(&self, key: &str) -> Result<Option<u64>> {
        let state = self.state.read().await;
        Ok(state.scores.get(key).map(|set| set.len() as u64))
    }

    async fn read_scores(&self, key: &str) -> Result<Option<Vec<(String, i64)>>> {
        let state = self.state.read().await;
        Ok(state.scores.get(key).map(|set| {
            let mut pairs: Vec<(String, i64)> =
                set.iter().map(|(m, s)| (m.clone(), *s)).collect();
            pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            pairs
        }))
    }

    async fn replace_scores(&self, key: &str, scores: &[(String, i64)]) -> Result<()> {
        let mut state = self.state.write().await;
        if scores.is_empty() {
            state.scores.remove(key);
        } else {
            state
                .scores
                .insert(key.to_string(), scores.iter().cloned().collect());
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.scores.contains_key(key) || state.mappings.contains_key(key))
    }

    async fn read_mapping(&self, key: &str) -> Result<BTreeMap<String, i64>> {
        let state = self.state.read().await;
        Ok(state.mappings.get(key).cloned().unwrap_or_default())
    }

    async fn write_mapping(&self, key: &str, mapping: &[(String, i64)]) -> Result<()> {
        let mut state = self.state.write().await;
        if mapping.is_empty() {
            state.mappings.remove(key);
        } else {
            state
                .mappings
                .insert(key.to_string(), mapping.iter().cloned().collect());
        }
        Ok(())
    }
}
