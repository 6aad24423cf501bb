//! Resolution services
//!
//! Leaves first: text normalization and candidate matching are pure; the
//! feed and catalog clients and the cache gateway sit at the I/O edges;
//! the pipeline ties them together.

pub mod cache_gateway;
pub mod catalog_client;
pub mod catalog_matcher;
pub mod content_filter;
pub mod enrichment;
pub mod feed_fetcher;
pub mod resolution_pipeline;
pub mod text_normalizer;

pub use cache_gateway::{CacheStore, SqliteCacheStore};
pub use catalog_client::{CatalogApi, CatalogError, SpotifyClient};
pub use content_filter::{BlockedTerm, ContentFilter};
pub use enrichment::EnrichmentError;
pub use feed_fetcher::{FeedError, FeedSource, RedditClient};
pub use resolution_pipeline::{PipelineError, PipelineSettings, ResolutionPipeline};
pub use text_normalizer::NormalizeError;
