use thiserror::Error;

/// Errors surfaced to the caller of [`resolve_url`](crate::resolve_url).
///
/// Everything that goes wrong inside a single strategy stays internal: the
/// pipeline recovers by moving on to the next strategy and only reports the
/// unified [`ResolveError::Exhausted`] once every strategy has run dry.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input URL carries no recognizable post path. Terminal; nothing is
    /// fetched for an invalid reference.
    #[error("Invalid Instagram URL")]
    InvalidUrl,

    /// Every strategy failed or found nothing. Deliberately generic — which
    /// strategy broke, and how, stays in the logs.
    #[error("Could not retrieve media from this Instagram post. Instagram may be blocking requests. Please try again in a few minutes.")]
    Exhausted,
}

/// Failure of a single strategy. Recovered by the pipeline, logged for
/// diagnostics, never shown to the caller.
#[derive(Debug, Error)]
pub(crate) enum StrategyError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StrategyError {
    fn from(err: reqwest::Error) -> Self {
        StrategyError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for StrategyError {
    fn from(err: serde_json::Error) -> Self {
        StrategyError::Parse(err.to_string())
    }
}
