use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::thumbnail::{Materializer, ThumbnailSource};
use super::types::{MediaItem, MediaKind, Strategy, StrategyOutcome};
use crate::config;
use crate::error::StrategyError;
use crate::fetch::browser_client;

const OEMBED_ENDPOINT: &str = "https://i.instagram.com/api/v1/oembed/";

/// Last-resort single-thumbnail recovery through the oEmbed endpoint.
///
/// No collection or video support — one representative image, delivered as
/// embedded bytes or not at all. A bare remote URL is useless here: this
/// strategy only runs when hotlinking is already known to be blocked.
pub(crate) struct OembedStrategy;

impl Strategy for OembedStrategy {
    fn name(&self) -> &'static str {
        "oembed"
    }

    fn run(&self, shortcode: &str) -> StrategyOutcome {
        let thumbnail_url = match fetch_oembed_thumbnail(shortcode) {
            Ok(Some(url)) => url,
            Ok(None) => return StrategyOutcome::Empty,
            Err(e) => return StrategyOutcome::Failed(e),
        };

        let materializer = Materializer::new();
        match materializer.embedded_thumbnail(&thumbnail_url) {
            Some(thumbnail) => StrategyOutcome::Found(vec![MediaItem {
                kind: MediaKind::Image,
                url_high: thumbnail_url.clone(),
                url_low: thumbnail_url,
                thumbnail,
            }]),
            None => {
                debug!("oembed thumbnail fetch failed, nothing to deliver");
                StrategyOutcome::Empty
            }
        }
    }
}

fn fetch_oembed_thumbnail(shortcode: &str) -> Result<Option<String>, StrategyError> {
    let post_url = format!("https://www.instagram.com/p/{shortcode}/");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", &post_url)
        .finish();
    let endpoint = format!("{OEMBED_ENDPOINT}?{query}");

    let client = browser_client(config::ASSET_TIMEOUT)?;
    let resp = client
        .get(&endpoint)
        .header(ACCEPT, "application/json")
        .send()?;

    let status = resp.status();
    if status != StatusCode::OK {
        debug!(shortcode, status = status.as_u16(), "oembed returned non-200");
        return Ok(None);
    }

    let text = resp.text()?;
    let json: Value = serde_json::from_str(&text)?;
    Ok(json
        .get("thumbnail_url")
        .and_then(|v| v.as_str())
        .map(String::from))
}
