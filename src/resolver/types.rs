use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One resolved media asset.
///
/// `url_high` and `url_low` are never empty; they are equal when the upstream
/// exposes no distinct lower-quality variant. `thumbnail` is either an
/// embedded `data:` URL or, when materialization failed, the display URL
/// itself — never empty either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url_high: String,
    pub url_low: String,
    pub thumbnail: String,
}

/// Final resolution payload, in the platform's declared display order.
/// Serialized as-is by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPost {
    pub success: bool,
    pub media: Vec<MediaItem>,
}

impl ResolvedPost {
    pub(crate) fn new(media: Vec<MediaItem>) -> Self {
        Self {
            success: true,
            media,
        }
    }
}

/// What a single strategy run produced. `Empty` and `Failed` both advance the
/// pipeline to the next strategy; only `Found` is terminal.
#[derive(Debug)]
pub(crate) enum StrategyOutcome {
    Found(Vec<MediaItem>),
    Empty,
    Failed(StrategyError),
}

/// One extraction strategy in the fallback chain.
pub(crate) trait Strategy {
    fn name(&self) -> &'static str;
    fn run(&self, shortcode: &str) -> StrategyOutcome;
}
