use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::fetch::AssetFetcher;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Turns a remote media URL into a self-contained thumbnail, or reports that
/// it could not.
pub(crate) trait ThumbnailSource {
    fn embedded_thumbnail(&self, url: &str) -> Option<String>;
}

/// Fetches the asset and embeds it as a `data:` URL. The CDN rejects
/// third-party referrers, so handing a client the remote URL directly would
/// render a broken image; embedding the bytes sidesteps that entirely.
pub(crate) struct Materializer {
    fetcher: AssetFetcher,
}

impl Materializer {
    pub fn new() -> Self {
        Self {
            fetcher: AssetFetcher::new(),
        }
    }
}

impl ThumbnailSource for Materializer {
    fn embedded_thumbnail(&self, url: &str) -> Option<String> {
        let asset = self.fetcher.fetch(url)?;
        Some(encode_data_url(&asset.bytes, asset.content_type.as_deref()))
    }
}

fn encode_data_url(bytes: &[u8], content_type: Option<&str>) -> String {
    format!(
        "data:{};base64,{}",
        content_type.unwrap_or(DEFAULT_CONTENT_TYPE),
        STANDARD.encode(bytes)
    )
}
