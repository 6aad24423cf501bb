//! Inbound query and page shapes

use serde::Serialize;

use super::{RawPost, RequestKind, ResolvedItem};

/// Parameters for one feed page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Forum source, with or without the `r/` prefix
    pub source: String,
    pub kind: RequestKind,
    pub sort: String,
    pub time_range: String,
    pub page: u32,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// One page of raw posts plus pagination cursors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<RawPost>,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// Pipeline output for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedPage {
    pub results: Vec<ResolvedItem>,
    pub after: Option<String>,
    pub before: Option<String>,
}
