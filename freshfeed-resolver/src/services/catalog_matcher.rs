//! Candidate selection for free-text catalog searches
//!
//! A search may return several plausible entries. Albums are matched on an
//! exact (case-insensitive) name against the title parts extracted from the
//! post. Tracks are matched on type only, and only the two highest-ranked
//! candidates are trusted.

use super::catalog_client::{AlbumRecord, TrackRecord};

/// How many track candidates are scanned before giving up
const TRACK_SCAN_DEPTH: usize = 2;

/// Entry chosen from a search result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate<'a> {
    Album(&'a AlbumRecord),
    Track(&'a TrackRecord),
}

/// Pick the best album among search candidates.
///
/// Returns `None` only when there are no candidates. With several, the first
/// whose name equals either confirmation string wins; otherwise the top result.
pub fn select_album<'a>(
    candidates: &'a [AlbumRecord],
    title_a: Option<&str>,
    title_b: Option<&str>,
) -> Option<&'a AlbumRecord> {
    match candidates {
        [] => None,
        [only] => Some(only),
        [first, ..] => {
            let confirmations: Vec<String> = [title_a, title_b]
                .into_iter()
                .flatten()
                .map(|title| title.trim().to_uppercase())
                .collect();

            candidates
                .iter()
                .find(|album| {
                    let name = album.name.to_uppercase();
                    confirmations.iter().any(|c| *c == name)
                })
                .or(Some(first))
        }
    }
}

/// Pick the best track among search candidates.
///
/// A lone candidate from a single resolves to the single itself. Otherwise the
/// first of the top two that is a bare track or sits on a single wins.
pub fn select_track(candidates: &[TrackRecord]) -> Option<Candidate<'_>> {
    let first = candidates.first()?;

    if candidates.len() == 1 && first.is_on_single() {
        return first.album.as_ref().map(Candidate::Album);
    }

    if first.is_bare_track() {
        return Some(Candidate::Track(first));
    }

    if let Some(hit) = candidates
        .iter()
        .take(TRACK_SCAN_DEPTH)
        .find(|track| track.is_on_single() || track.is_bare_track())
    {
        return Some(Candidate::Track(hit));
    }

    if first.is_on_single() {
        return first.album.as_ref().map(Candidate::Album);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(name: &str) -> AlbumRecord {
        AlbumRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            record_type: "album".to_string(),
            album_type: Some("album".to_string()),
            ..Default::default()
        }
    }

    fn track(id: &str, record_type: &str, album_type: &str) -> TrackRecord {
        TrackRecord {
            id: id.to_string(),
            name: id.to_string(),
            record_type: record_type.to_string(),
            album: Some(AlbumRecord {
                id: format!("{}-album", id),
                album_type: Some(album_type.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_album_empty() {
        assert_eq!(select_album(&[], Some("x"), Some("y")), None);
    }

    #[test]
    fn test_select_album_single_candidate() {
        let candidates = vec![album("A")];
        assert_eq!(
            select_album(&candidates, Some("x"), Some("y")),
            Some(&candidates[0])
        );
    }

    #[test]
    fn test_select_album_exact_name_match() {
        let candidates = vec![album("A"), album("B_NAME")];
        assert_eq!(
            select_album(&candidates, Some("B_NAME"), Some("z")),
            Some(&candidates[1])
        );
    }

    #[test]
    fn test_select_album_match_is_case_insensitive_and_trimmed() {
        let candidates = vec![album("First"), album("Second Record")];
        assert_eq!(
            select_album(&candidates, Some("nope"), Some("  second record ")),
            Some(&candidates[1])
        );
    }

    #[test]
    fn test_select_album_falls_back_to_first() {
        let candidates = vec![album("First"), album("Second")];
        assert_eq!(
            select_album(&candidates, Some("Third"), None),
            Some(&candidates[0])
        );
        assert_eq!(select_album(&candidates, None, None), Some(&candidates[0]));
    }

    #[test]
    fn test_select_track_empty() {
        assert_eq!(select_track(&[]), None);
    }

    #[test]
    fn test_select_track_lone_single_returns_album() {
        let candidates = vec![track("t1", "track", "single")];
        match select_track(&candidates) {
            Some(Candidate::Album(album)) => assert_eq!(album.id, "t1-album"),
            other => panic!("expected album, got {:?}", other),
        }
    }

    #[test]
    fn test_select_track_first_bare_track() {
        let candidates = vec![track("t1", "track", "album"), track("t2", "track", "single")];
        assert_eq!(
            select_track(&candidates),
            Some(Candidate::Track(&candidates[0]))
        );
    }

    #[test]
    fn test_select_track_scans_second_candidate() {
        let candidates = vec![track("e1", "episode", "album"), track("t2", "track", "album")];
        assert_eq!(
            select_track(&candidates),
            Some(Candidate::Track(&candidates[1]))
        );
    }

    #[test]
    fn test_select_track_single_in_top_two() {
        let candidates = vec![
            track("e1", "episode", "album"),
            track("e2", "episode", "single"),
        ];
        assert_eq!(
            select_track(&candidates),
            Some(Candidate::Track(&candidates[1]))
        );
    }

    #[test]
    fn test_select_track_stops_after_two() {
        let candidates = vec![
            track("e1", "episode", "album"),
            track("e2", "episode", "album"),
            track("t3", "track", "single"),
        ];
        assert_eq!(select_track(&candidates), None);
    }
}
