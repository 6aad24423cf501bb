//! Data models for the resolution pipeline

pub mod feed_item;
pub mod query;
pub mod resolved_item;

pub use feed_item::{CatalogRef, FeedItem, ItemSource, RawPost, RedditInfo, RequestKind};
pub use query::{FeedPage, FeedQuery, ResolvedPage};
pub use resolved_item::{CatalogInfo, CatalogLink, Resolution, ResolvedItem};
