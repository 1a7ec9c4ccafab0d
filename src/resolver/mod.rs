//! Orchestrator: graphql -> embed page -> oembed.
//!
//! Each strategy is a progressively cheaper, less complete degradation of the
//! one before it, so they run strictly in sequence and the first non-empty
//! result wins. Running them concurrently would just burn extra calls against
//! a rate-limited origin.

mod embed_page;
mod graphql;
mod oembed;
pub(crate) mod thumbnail;
pub mod types;

use tracing::{debug, warn};

use self::embed_page::EmbedPageStrategy;
use self::graphql::GraphqlStrategy;
use self::oembed::OembedStrategy;
use self::types::{ResolvedPost, Strategy, StrategyOutcome};
use crate::error::ResolveError;

/// Resolves a shortcode through the full fallback chain.
pub(crate) fn resolve_media(shortcode: &str) -> Result<ResolvedPost, ResolveError> {
    let strategies: [&dyn Strategy; 3] = [&GraphqlStrategy, &EmbedPageStrategy, &OembedStrategy];
    run_chain(shortcode, &strategies)
}

fn run_chain(shortcode: &str, strategies: &[&dyn Strategy]) -> Result<ResolvedPost, ResolveError> {
    for strategy in strategies {
        debug!(strategy = strategy.name(), shortcode, "running strategy");

        match strategy.run(shortcode) {
            StrategyOutcome::Found(media) => {
                debug!(strategy = strategy.name(), count = media.len(), "strategy succeeded");
                return Ok(ResolvedPost::new(media));
            }
            StrategyOutcome::Empty => {
                debug!(strategy = strategy.name(), shortcode, "strategy found nothing");
            }
            StrategyOutcome::Failed(error) => {
                // Diagnostics only; the caller gets the unified message.
                warn!(strategy = strategy.name(), shortcode, %error, "strategy failed");
            }
        }
    }

    Err(ResolveError::Exhausted)
}
