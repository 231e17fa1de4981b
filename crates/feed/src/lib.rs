//! Article feed: API decoding, same-day cache, and the list views the UI
//! and the globe are built from.

pub mod api;
pub mod article;
pub mod cache;
pub mod error;
pub mod format;
pub mod headlines;
pub mod paging;
pub mod query;
pub mod state;

pub use api::{ApiConfig, ArticlePage, PageRequest};
pub use article::{Article, LatLngLabel};
pub use cache::{ArticleCache, CacheLookup, InMemoryStore, KeyValueStore};
pub use error::{ApiError, CacheError, FeedError};
pub use state::{FeedState, Outcome, RefreshPlan, RequestToken};
