use thiserror::Error;

/// Message surfaced to the UI when a fetch fails without a better one.
pub const DEFAULT_FETCH_ERROR: &str = "Failed to fetch articles";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid api url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("storage unavailable")]
    StorageUnavailable,
    #[error("storage io: {0}")]
    Io(String),
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FeedError {
    /// Text shown in the feed's error slot.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Api(ApiError::Transport(msg)) if !msg.is_empty() => msg.clone(),
            FeedError::Api(_) | FeedError::Cache(_) => DEFAULT_FETCH_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, CacheError, DEFAULT_FETCH_ERROR, FeedError};

    #[test]
    fn transport_message_passes_through() {
        let err = FeedError::from(ApiError::Transport("Network Error".into()));
        assert_eq!(err.user_message(), "Network Error");
    }

    #[test]
    fn other_failures_use_default_message() {
        assert_eq!(
            FeedError::from(ApiError::Status(502)).user_message(),
            DEFAULT_FETCH_ERROR
        );
        assert_eq!(
            FeedError::from(CacheError::StorageUnavailable).user_message(),
            DEFAULT_FETCH_ERROR
        );
        assert_eq!(
            FeedError::from(ApiError::Transport(String::new())).user_message(),
            DEFAULT_FETCH_ERROR
        );
    }
}
