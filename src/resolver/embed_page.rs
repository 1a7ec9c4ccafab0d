use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::thumbnail::{Materializer, ThumbnailSource};
use super::types::{MediaItem, MediaKind, Strategy, StrategyOutcome};
use crate::config;
use crate::error::StrategyError;
use crate::fetch::browser_client;
use crate::utils::post_url;

/// CDN image URLs appearing as `src`/`srcset`/`data-src` attribute values.
static MEDIA_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:src|srcset|data-src)=["'](https://(?:scontent|instagram)[^"']+?\.(?:jpg|jpeg|png|webp)[^"']*)"#,
    )
    .unwrap()
});

/// Square-dimension token that marks profile icons rather than post content.
static ICON_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"s\d{2,3}x\d{2,3}").unwrap());

/// Scrapes the public embed rendering of a post.
///
/// The embed page is less aggressively rate-limited than the GraphQL endpoint
/// and still carries full-collection data when its inlined JSON survives.
pub(crate) struct EmbedPageStrategy;

impl Strategy for EmbedPageStrategy {
    fn name(&self) -> &'static str {
        "embed_page"
    }

    fn run(&self, shortcode: &str) -> StrategyOutcome {
        let html = match fetch_embed_markup(shortcode) {
            Ok(Some(html)) => html,
            Ok(None) => return StrategyOutcome::Empty,
            Err(e) => return StrategyOutcome::Failed(e),
        };

        let materializer = Materializer::new();
        let media = extract_media(&html, &materializer);
        if media.is_empty() {
            StrategyOutcome::Empty
        } else {
            StrategyOutcome::Found(media)
        }
    }
}

fn fetch_embed_markup(shortcode: &str) -> Result<Option<String>, StrategyError> {
    let url = format!("https://www.instagram.com/p/{shortcode}/embed/captioned/");
    let client = browser_client(config::PAGE_TIMEOUT)?;

    let resp = client
        .get(&url)
        .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .send()?;

    let status = resp.status();
    let html = resp.text()?;
    debug!(shortcode, status = status.as_u16(), html_len = html.len(), "embed page fetched");

    if status != StatusCode::OK {
        return Ok(None);
    }
    Ok(Some(html))
}

fn extract_media(html: &str, thumbs: &dyn ThumbnailSource) -> Vec<MediaItem> {
    if let Some(post) = extract_post_json(html) {
        let items = build_media_items(&post, thumbs);
        if !items.is_empty() {
            return items;
        }
        debug!("structured blob carried no media, falling back to markup scan");
    }

    scrape_markup(html, thumbs)
}

// ---------------------------------------------------------------------------
// Step 1: structured-blob extraction
// ---------------------------------------------------------------------------

struct BlobExtractor {
    name: &'static str,
    extract: fn(&str) -> Option<Value>,
}

/// Known inlined-JSON wrappers, tried in order; the first one that yields a
/// parseable post object wins. New wrapper shapes slot in here.
const BLOB_EXTRACTORS: &[BlobExtractor] = &[
    BlobExtractor {
        name: "additional_data",
        extract: extract_additional_data,
    },
    BlobExtractor {
        name: "shortcode_media",
        extract: extract_shortcode_media,
    },
    BlobExtractor {
        name: "context_json",
        extract: extract_context_json,
    },
];

fn extract_post_json(html: &str) -> Option<Value> {
    for extractor in BLOB_EXTRACTORS {
        if let Some(post) = (extractor.extract)(html) {
            debug!(marker = extractor.name, "structured blob matched");
            return Some(post);
        }
    }
    None
}

/// `window.__additionalDataLoaded('path', {...});` — the embed page's inline
/// bootstrap call. The payload is the object argument.
fn extract_additional_data(html: &str) -> Option<Value> {
    let start = html.find("window.__additionalDataLoaded")?;
    let rest = &html[start..];
    let open = rest.find('{')?;
    let blob = balanced_object(rest, open)?;
    let value: Value = serde_json::from_str(blob).ok()?;
    locate_post_object(&value)
}

/// Bare `"shortcode_media":{...}` blob anywhere in the markup.
fn extract_shortcode_media(html: &str) -> Option<Value> {
    let needle = "\"shortcode_media\":";
    let start = html.find(needle)?;
    let rest = &html[start + needle.len()..];
    let open = rest.find('{')?;
    let blob = balanced_object(rest, open)?;
    serde_json::from_str(blob).ok()
}

/// Double-encoded `"contextJSON":"..."` — a JSON string holding another JSON
/// document whose `gql_data` mirrors the shortcode_media shape.
fn extract_context_json(html: &str) -> Option<Value> {
    let needle = "\"contextJSON\":\"";
    let start = html.find(needle)?;
    let str_start = start + needle.len() - 1; // include the opening quote

    // Walk to the unescaped closing quote.
    let bytes = html.as_bytes();
    let mut i = str_start + 1;
    let mut escape = false;
    while i < bytes.len() {
        if escape {
            escape = false;
        } else if bytes[i] == b'\\' {
            escape = true;
        } else if bytes[i] == b'"' {
            break;
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    // Parsing the quoted slice unescapes the inner document.
    let inner: String = serde_json::from_str(&html[str_start..=i]).ok()?;
    let context: Value = serde_json::from_str(&inner).ok()?;
    let gql = context.get("gql_data")?;
    gql.get("shortcode_media")
        .or_else(|| gql.get("xdt_shortcode_media"))
        .cloned()
}

/// The post object may sit at the top level or nested one key down.
fn locate_post_object(value: &Value) -> Option<Value> {
    if let Some(post) = value
        .get("shortcode_media")
        .or_else(|| value.get("xdt_shortcode_media"))
    {
        return Some(post.clone());
    }

    value
        .get("graphql")
        .or_else(|| value.get("gql_data"))
        .and_then(|g| {
            g.get("shortcode_media")
                .or_else(|| g.get("xdt_shortcode_media"))
        })
        .cloned()
}

/// Extracts the balanced `{...}` object starting at byte offset `open`,
/// honoring string literals and escapes.
fn balanced_object(text: &str, open: usize) -> Option<&str> {
    if !text[open..].starts_with('{') {
        return None;
    }

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[open..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..open + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Shared post-object classification
// ---------------------------------------------------------------------------

/// Builds the ordered media list from a `shortcode_media`-shaped post object.
/// Carousel children keep their declared edge order.
pub(crate) fn build_media_items(post: &Value, thumbs: &dyn ThumbnailSource) -> Vec<MediaItem> {
    if let Some(children) = post
        .get("edge_sidecar_to_children")
        .and_then(|c| c.get("edges"))
        .and_then(|e| e.as_array())
    {
        return children
            .iter()
            .filter_map(|edge| edge.get("node"))
            .filter_map(|node| media_from_node(node, thumbs))
            .collect();
    }

    media_from_node(post, thumbs).into_iter().collect()
}

fn media_from_node(node: &Value, thumbs: &dyn ThumbnailSource) -> Option<MediaItem> {
    let display_url = node
        .get("display_url")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let is_video = node.get("is_video").and_then(|v| v.as_bool()).unwrap_or(false);

    if is_video {
        // Some embed variants omit video_url; the display URL still names the
        // asset, just at poster quality.
        let video_url = node
            .get("video_url")
            .and_then(|v| v.as_str())
            .filter(|u| !u.is_empty())
            .unwrap_or(display_url);
        if video_url.is_empty() {
            return None;
        }

        let thumb_source = if display_url.is_empty() { video_url } else { display_url };
        let thumbnail = thumbs
            .embedded_thumbnail(thumb_source)
            .unwrap_or_else(|| thumb_source.to_string());

        return Some(MediaItem {
            kind: MediaKind::Video,
            url_high: video_url.to_string(),
            url_low: video_url.to_string(),
            thumbnail,
        });
    }

    if display_url.is_empty() {
        return None;
    }

    let thumbnail = thumbs
        .embedded_thumbnail(display_url)
        .unwrap_or_else(|| display_url.to_string());

    Some(MediaItem {
        kind: MediaKind::Image,
        url_high: display_url.to_string(),
        url_low: display_url.to_string(),
        thumbnail,
    })
}

// ---------------------------------------------------------------------------
// Step 2: markup-pattern extraction
// ---------------------------------------------------------------------------

fn scrape_markup(html: &str, thumbs: &dyn ThumbnailSource) -> Vec<MediaItem> {
    let candidates = collect_cdn_urls(html);
    let urls = apply_icon_filter(dedup_cdn_urls(candidates));

    let mut items = Vec::new();
    for url in urls {
        // No guaranteed display field backs this path; only emit what we can
        // actually embed.
        let Some(thumbnail) = thumbs.embedded_thumbnail(&url) else {
            debug!(%url, "dropping markup candidate, thumbnail fetch failed");
            continue;
        };
        items.push(MediaItem {
            kind: MediaKind::Image,
            url_high: url.clone(),
            url_low: url,
            thumbnail,
        });
    }
    items
}

fn collect_cdn_urls(html: &str) -> Vec<String> {
    MEDIA_SRC_RE
        .captures_iter(html)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Deduplicates by `se=`-stripped URL, preserving first-seen order.
fn dedup_cdn_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for url in urls {
        if seen.insert(post_url::dedup_key(&url)) {
            unique.push(url);
        }
    }
    unique
}

/// Drops profile-icon-sized URLs, unless that would drop everything —
/// icons-only posts beat empty results.
fn apply_icon_filter(urls: Vec<String>) -> Vec<String> {
    let full: Vec<String> = urls
        .iter()
        .filter(|u| !ICON_SIZE_RE.is_match(u))
        .cloned()
        .collect();
    if full.is_empty() {
        urls
    } else {
        full
    }
}
