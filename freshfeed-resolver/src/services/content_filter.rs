//! Content-quality blocklist applied to resolved names

use crate::models::{RequestKind, ResolvedItem};

/// A case-insensitive substring that disqualifies a resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedTerm {
    pub term: String,
    /// Restrict the term to one request kind; `None` applies it to all
    pub only_for: Option<RequestKind>,
}

impl BlockedTerm {
    pub fn always(term: &str) -> Self {
        Self {
            term: term.to_lowercase(),
            only_for: None,
        }
    }

    pub fn for_kind(term: &str, kind: RequestKind) -> Self {
        Self {
            term: term.to_lowercase(),
            only_for: Some(kind),
        }
    }

    fn applies_to(&self, kind: RequestKind) -> bool {
        self.only_for.map_or(true, |only| only == kind)
    }
}

/// Drops resolutions whose catalog name contains a blocked term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    terms: Vec<BlockedTerm>,
}

impl ContentFilter {
    pub fn new(terms: Vec<BlockedTerm>) -> Self {
        Self { terms }
    }

    /// A filter that lets everything through
    pub fn permissive() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn is_blocked(&self, name: &str, kind: RequestKind) -> bool {
        let name = name.to_lowercase();
        self.terms
            .iter()
            .any(|blocked| blocked.applies_to(kind) && name.contains(&blocked.term))
    }

    /// True for resolved items whose name passes the blocklist
    pub fn permits(&self, item: &ResolvedItem) -> bool {
        item.catalog_info()
            .is_some_and(|info| !self.is_blocked(&info.name, item.item.request_kind))
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(vec![
            BlockedTerm::always("karaoke"),
            BlockedTerm::always("meditation"),
            BlockedTerm::for_kind("donda", RequestKind::Track),
        ])
    }
}
