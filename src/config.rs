//! Tunables for the resolution pipeline, overridable through the environment.

use std::env;
use std::time::Duration;

/// GraphQL persisted-query document ID for the post-detail query. Rotates
/// every few weeks; override with `GRAPHQL_DOC_ID` when the default goes
/// stale.
const DEFAULT_GRAPHQL_DOC_ID: &str = "25531498899829322";

/// Timeout for single asset and metadata fetches.
pub const ASSET_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for full page fetches (the embed page markup is large).
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Attempts for the primary strategy before it reports failure.
pub const GRAPHQL_ATTEMPTS: u32 = 2;

/// Pause between those attempts.
pub const RETRY_PAUSE: Duration = Duration::from_secs(1);

pub fn graphql_doc_id() -> String {
    env::var("GRAPHQL_DOC_ID").unwrap_or_else(|_| DEFAULT_GRAPHQL_DOC_ID.to_string())
}
