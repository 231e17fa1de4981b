use feed::{CacheError, FeedError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unknown sort key {0:?} (expected one of: None, date, date-desc, sentiment, sentiment-desc)")]
    UnknownSort(String),
    /// The feed recorded a failed load.
    #[error("{0}")]
    Load(String),
    #[error("json output failed: {0}")]
    Json(#[from] serde_json::Error),
}
