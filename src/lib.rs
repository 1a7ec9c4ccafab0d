//! Resolves an Instagram post URL into an ordered list of normalized media
//! descriptors (images and videos, each with high/low quality URLs and a
//! self-contained thumbnail).
//!
//! No single upstream access path survives the origin's rate limiting for
//! long, so resolution runs an ordered chain of independent strategies —
//! GraphQL post-detail query, embed-page scrape, oEmbed thumbnail — and
//! returns the first non-empty result. The HTTP surface, CORS handling, and
//! process wiring live outside this crate; it exposes the resolution entry
//! points, the serializable result types, and the [`AssetFetcher`] shared
//! with the image-proxy layer.

mod config;
pub mod error;
pub mod fetch;
mod resolver;
mod utils;

use tracing::info;

pub use error::ResolveError;
pub use fetch::{AssetFetcher, FetchedAsset};
pub use resolver::types::{MediaItem, MediaKind, ResolvedPost};

/// Resolves a post URL to its media items.
///
/// Shortcode extraction is the only input validation; a URL without a
/// recognizable post path fails immediately and nothing is fetched.
pub fn resolve_url(url: &str) -> Result<ResolvedPost, ResolveError> {
    let shortcode = utils::post_url::extract_shortcode(url).ok_or(ResolveError::InvalidUrl)?;
    info!(%shortcode, "resolving post");
    resolver::resolve_media(&shortcode)
}

/// Resolves an already-normalized shortcode.
///
/// The image-proxy layer addresses posts by shortcode directly; everything
/// else goes through [`resolve_url`].
pub fn resolve_shortcode(shortcode: &str) -> Result<ResolvedPost, ResolveError> {
    resolver::resolve_media(shortcode)
}
