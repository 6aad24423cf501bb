//! Text normalization for forum posts
//!
//! Pulls a candidate artist and release title out of a free-form post title,
//! and a catalog item id/type out of any text carrying a catalog URL.
//! Everything here is pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{CatalogRef, FeedItem, ItemSource, RawPost, RedditInfo, RequestKind};

/// Host marker that classifies a post as a direct link
pub const CATALOG_DOMAIN: &str = "open.spotify.com";

/// Marker the item path follows
const CATALOG_PATH_MARKER: &str = ".spotify.com/";

/// Catalog ids are 22 base-62 characters
const CATALOG_ID_LEN: usize = 22;

/// Separates artist from release in post titles
const TITLE_DELIMITER: &str = " - ";

const FEATURING_MARKER: &str = "ft.";

const ARTIST_SEPARATORS: &[&str] = &["/", "\\", "#", "&", "\"", ":"];
const ALBUM_SEPARATORS: &[&str] = &["ft.", "/", "\\", "#", "&"];

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").expect("bracket pattern is valid"));
static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*\)").expect("paren pattern is valid"));
static AND_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\band\b").expect("and pattern is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,8})|([0-9]{1,10}));").expect("entity pattern is valid")
});

/// Normalization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The text does not carry a parseable catalog URL
    #[error("Malformed catalog reference: {0}")]
    MalformedReference(String),
}

/// Extract the catalog item reference from a URL or a body of text containing one.
///
/// The segment after the domain is the item type (a leading `intl-xx` locale
/// segment is skipped); the id is the run of up to 22 alphanumerics after it.
pub fn extract_catalog_ref(text: &str) -> Result<CatalogRef, NormalizeError> {
    let malformed = || NormalizeError::MalformedReference(preview(text));

    let (_, rest) = text.split_once(CATALOG_PATH_MARKER).ok_or_else(malformed)?;

    let mut segments = rest.splitn(3, '/');
    let mut catalog_type = segments.next().unwrap_or_default();
    let mut remainder = segments.next();
    if catalog_type.starts_with("intl-") {
        catalog_type = remainder.unwrap_or_default();
        remainder = segments.next();
    }

    let catalog_id: String = remainder
        .unwrap_or_default()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .take(CATALOG_ID_LEN)
        .collect();

    if catalog_type.is_empty() || catalog_id.is_empty() {
        return Err(malformed());
    }

    Ok(CatalogRef {
        catalog_id,
        catalog_type: catalog_type.to_string(),
    })
}

/// Artist part of a post title: text before the first ` - `, cut at `ft.`
pub fn extract_artist(title: &str) -> String {
    let reduced = replace_separators(&strip_segments(title), ARTIST_SEPARATORS);
    let artist = reduced.split(TITLE_DELIMITER).next().unwrap_or_default();
    let artist = artist.split(FEATURING_MARKER).next().unwrap_or_default();
    collapse_whitespace(artist)
}

/// Release part of a post title: the segment after the first ` - `
///
/// Returns `None` when the title has no delimiter or the segment is blank.
pub fn extract_album(title: &str) -> Option<String> {
    let reduced = replace_separators(&strip_segments(title), ALBUM_SEPARATORS);
    reduced
        .split(TITLE_DELIMITER)
        .nth(1)
        .map(collapse_whitespace)
        .filter(|album| !album.is_empty())
}

/// Decode the entities the feed source escapes in titles
///
/// Covers the common named entities plus decimal and hex character
/// references. `&amp;` is decoded last so text is only unescaped once.
pub fn decode_html_entities(text: &str) -> String {
    let named = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");
    decode_numeric_entities(&named).replace("&amp;", "&")
}

/// Replace `&#NNN;` and `&#xHH;` with their characters.
/// References to invalid code points are left as written.
fn decode_numeric_entities(text: &str) -> String {
    NUMERIC_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
                (None, None) => None,
            };
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Decide how a post will be resolved
pub fn classify(post: &RawPost) -> Result<ItemSource, NormalizeError> {
    if post.url.contains(CATALOG_DOMAIN) {
        return extract_catalog_ref(&post.url).map(ItemSource::DirectLink);
    }
    if post.selftext.contains(&format!("{}/", CATALOG_DOMAIN)) {
        return extract_catalog_ref(&post.selftext).map(ItemSource::DirectLink);
    }
    Ok(ItemSource::FreeText)
}

/// Build a feed item from a raw post
///
/// `feed_base_url` is prefixed to the post permalink.
pub fn normalize_post(
    post: &RawPost,
    kind: RequestKind,
    feed_base_url: &str,
) -> Result<FeedItem, NormalizeError> {
    let title = decode_html_entities(&post.title);
    let source = classify(post)?;

    Ok(FeedItem {
        id: post.id.clone(),
        request_kind: kind,
        reddit_info: RedditInfo {
            artist: extract_artist(&title),
            album: extract_album(&title),
            score: post.score,
            url: format!("{}{}", feed_base_url, post.permalink),
        },
        source,
    })
}

/// Normalize a page of posts, preserving order.
///
/// Posts with a malformed catalog reference are dropped.
pub fn normalize_posts(posts: &[RawPost], kind: RequestKind, feed_base_url: &str) -> Vec<FeedItem> {
    posts
        .iter()
        .filter_map(|post| match normalize_post(post, kind, feed_base_url) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "Dropping post");
                None
            }
        })
        .collect()
}

fn strip_segments(title: &str) -> String {
    let without_brackets = BRACKETED.replace_all(title, "");
    PARENTHESIZED.replace_all(&without_brackets, "").into_owned()
}

fn replace_separators(text: &str, separators: &[&str]) -> String {
    let mut reduced = AND_WORD.replace_all(text, " ").into_owned();
    for separator in separators {
        reduced = reduced.replace(separator, " ");
    }
    reduced
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
