//! Test Helper Utilities
//!
//! In-memory stand-ins for the feed source and the catalog, plus builders
//! for posts and catalog records.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeCatalog, FakeFeed};
pub use fixtures::{
    album_post, album_record, memory_cache, pipeline, pipeline_with, post, query, text_post,
    track_record,
};
