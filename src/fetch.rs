use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, CONTENT_TYPE, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::StatusCode;
use tracing::debug;

use crate::config;
use crate::error::StrategyError;

pub(crate) const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Standard browser-shaped header set. The CDN and the embed page both reject
/// obviously non-browser traffic.
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CHROME_UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.instagram.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.instagram.com"));
    headers
}

/// Fresh client with the browser header set and a bounded timeout.
///
/// Strategies build one per run: a rate-limit penalty or stale session picked
/// up by one resolution must not leak into the next.
pub(crate) fn browser_client(timeout: Duration) -> Result<Client, StrategyError> {
    Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .build()
        .map_err(|e| StrategyError::Network(e.to_string()))
}

/// Raw bytes plus the declared content type of a fetched asset.
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// One-shot outbound byte fetch with browser-like headers.
///
/// Shared between thumbnail materialization and the image-proxy layer that
/// serves CDN bytes back to clients when direct hotlinking is blocked.
pub struct AssetFetcher {
    client: Client,
}

impl AssetFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(config::ASSET_TIMEOUT)
            .build()
            .expect("asset fetcher client build should succeed");
        Self { client }
    }

    /// Fetches `url`, returning the body and content type on HTTP 200.
    ///
    /// Any other status, and any transport error, yields `None` — nothing
    /// escapes this boundary.
    pub fn fetch(&self, url: &str) -> Option<FetchedAsset> {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url, error = %e, "asset fetch failed");
                return None;
            }
        };

        let status = resp.status();
        if status != StatusCode::OK {
            debug!(url, status = status.as_u16(), "asset fetch returned non-200");
            return None;
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        match resp.bytes() {
            Ok(bytes) => Some(FetchedAsset {
                bytes: bytes.to_vec(),
                content_type,
            }),
            Err(e) => {
                debug!(url, error = %e, "asset body read failed");
                None
            }
        }
    }
}

impl Default for AssetFetcher {
    fn default() -> Self {
        Self::new()
    }
}
