//! Configuration for the statistics engine, its event store and its cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Top-level configuration, usually loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub stats: EngineConfig,
}

/// Where the event store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Local database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Remote Turso database URL; takes precedence over `path` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Auth token for the remote database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Which cache backend to use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,

    /// Connection timeout for the Redis connection manager.
    #[serde(default = "default_connection_timeout", with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Reconnect attempts before a cache call fails.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

/// Aggregation knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Offset of the display zone used by the monthly histogram.
    #[serde(default = "default_display_utc_offset_hours")]
    pub display_utc_offset_hours: i32,

    /// Number of entries on the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("movelog").join("movelog.db"))
        .unwrap_or_else(|| PathBuf::from("/tmp/movelog/movelog.db"))
}

fn default_connection_timeout() -> Duration {
    Duration::from_millis(100)
}

fn default_retries() -> usize {
    1
}

fn default_display_utc_offset_hours() -> i32 {
    9
}

fn default_leaderboard_size() -> usize {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            remote_url: None,
            auth_token: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connection_timeout: default_connection_timeout(),
            retries: default_retries(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_utc_offset_hours: default_display_utc_offset_hours(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

impl StatsConfig {
    /// Default config file location: `$XDG_CONFIG_HOME/movelog/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("movelog").join("config.toml")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".config/movelog/config.toml")
        } else {
            PathBuf::from(".config/movelog/config.toml")
        }
    }

    /// Load from `path`, or from the default location if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    debug!(path = %default.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.display_offset().is_none() {
            return Err(Error::Config(format!(
                "display_utc_offset_hours out of range: {}",
                self.stats.display_utc_offset_hours
            )));
        }
        if self.stats.leaderboard_size == 0 {
            return Err(Error::Config("leaderboard_size must be > 0".into()));
        }
        Ok(())
    }

    /// The display zone as a fixed offset, if in range.
    #[must_use]
    pub fn display_offset(&self) -> Option<FixedOffset> {
        self.stats
            .display_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
    }

    /// Use a local database file.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    /// Use a Redis cache.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.cache.redis_url = Some(url.into());
        self
    }

    /// Set the display zone offset in hours.
    #[must_use]
    pub fn with_display_utc_offset_hours(mut self, hours: i32) -> Self {
        self.stats.display_utc_offset_hours = hours;
        self
    }

    /// Set the leaderboard size.
    #[must_use]
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.stats.leaderboard_size = size;
        self
    }
}
