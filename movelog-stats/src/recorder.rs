//! Incremental write path for newly logged actions.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{StatsCache, keys};
use crate::error::Result;
use crate::types::KeywordRecord;

/// Bumps the cached counters for each newly persisted record.
///
/// Each counter is a separate single-key increment. A failure part way
/// through leaves the earlier counters bumped; the next backfill corrects it.
pub struct ActionRecorder {
    cache: Arc<dyn StatsCache>,
}

impl ActionRecorder {
    pub fn new(cache: Arc<dyn StatsCache>) -> Self {
        Self { cache }
    }

    /// Count `record` into its daily, weekly, monthly and total counters.
    #[instrument(skip(self, record), level = "debug", fields(record_id = %record.record_id))]
    pub async fn record(&self, record: &KeywordRecord) -> Result<()> {
        for key in keys::counters_for(record.category, record.date()) {
            let score = self.cache.increment(&key, &record.noun, 1).await?;
            debug!(key = %key, noun = %record.noun, score, "incremented counter");
        }
        Ok(())
    }
}
