//! Opens the store, cache and service described by the configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use movelog_stats::{
    CacheConfig, InMemoryStatsCache, RedisStatsCache, StatsCache, StatsConfig, StatsService,
    StoreConfig, SystemClock, TursoEventStore,
};
use tracing::{info, warn};

/// Everything a command needs.
pub struct Context {
    pub store: Arc<TursoEventStore>,
    pub service: StatsService,
}

impl Context {
    /// Load configuration, connect, and run the startup backfill.
    pub async fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = StatsConfig::load(config_path).context("loading configuration")?;

        let store = Arc::new(open_store(&config.store).await?);
        let cache = open_cache(&config.cache).await?;
        let service = StatsService::initialize(
            store.clone(),
            cache,
            Arc::new(SystemClock),
            &config,
        )
        .await
        .context("initializing stats service")?;

        Ok(Self { store, service })
    }
}

async fn open_store(config: &StoreConfig) -> Result<TursoEventStore> {
    let store = match &config.remote_url {
        Some(url) => {
            info!(url = %url, "opening remote event store");
            let token = config.auth_token.as_deref().unwrap_or_default();
            TursoEventStore::new_remote(url, token).await
        }
        None => {
            info!(path = %config.path.display(), "opening local event store");
            TursoEventStore::new_local(&config.path).await
        }
    };
    store.context("opening event store")
}

async fn open_cache(config: &CacheConfig) -> Result<Arc<dyn StatsCache>> {
    if config.redis_url.is_none() {
        warn!("no cache.redis_url configured, using a process-local cache");
        return Ok(Arc::new(InMemoryStatsCache::new()));
    }
    let cache = RedisStatsCache::connect(config)
        .await
        .context("connecting to redis")?;
    Ok(Arc::new(cache))
}
