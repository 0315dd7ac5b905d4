//! Error types for the statistics engine.
//!
//! An absent cache key is not an error: cache lookups return `Option` and the
//! engine falls back to the event store. Only a cache that cannot be reached
//! surfaces as [`Error::Cache`].

use thiserror::Error;

/// Result type for statistics operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing or caching statistics.
#[derive(Debug, Error)]
pub enum Error {
    /// Keyword (or another looked-up entity) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller supplied a bad category, period or month.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The event store could not be reached or the query failed.
    #[error("event store unavailable: {0}")]
    StoreUnavailable(#[from] libsql::Error),

    /// The cache backend could not be reached.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid data in the event store.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Cache(err.to_string())
    }
}

impl Error {
    /// Returns true for errors the caller caused and should not retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InvalidArgument(_))
    }
}
