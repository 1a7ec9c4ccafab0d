use std::thread;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use super::embed_page::build_media_items;
use super::thumbnail::Materializer;
use super::types::{Strategy, StrategyOutcome};
use crate::config;
use crate::error::StrategyError;
use crate::fetch::browser_client;

const GRAPHQL_ENDPOINT: &str = "https://www.instagram.com/api/graphql";

/// Public tokens embedded in the web app; sent so the request shape matches a
/// real browser session.
const IG_APP_ID: &str = "936619743392459";
const FB_LSD_TOKEN: &str = "AVoPBTXMX0Y";
const FB_ASBD_ID: &str = "129477";

/// Resolves the post through the internal GraphQL post-detail query — the
/// richest source, and the first one the origin rate-limits away.
pub(crate) struct GraphqlStrategy;

impl Strategy for GraphqlStrategy {
    fn name(&self) -> &'static str {
        "graphql"
    }

    fn run(&self, shortcode: &str) -> StrategyOutcome {
        let mut last_error: Option<StrategyError> = None;

        for attempt in 1..=config::GRAPHQL_ATTEMPTS {
            if attempt > 1 {
                thread::sleep(config::RETRY_PAUSE);
            }

            match fetch_post(shortcode) {
                Ok(Some(post)) => {
                    let materializer = Materializer::new();
                    let media = build_media_items(&post, &materializer);
                    return if media.is_empty() {
                        StrategyOutcome::Empty
                    } else {
                        StrategyOutcome::Found(media)
                    };
                }
                // A definitive no-media answer is not worth a retry.
                Ok(None) => return StrategyOutcome::Empty,
                Err(e) => {
                    warn!(shortcode, attempt, error = %e, "graphql attempt failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => StrategyOutcome::Failed(e),
            None => StrategyOutcome::Empty,
        }
    }
}

/// One eager round trip for the full post object.
fn fetch_post(shortcode: &str) -> Result<Option<Value>, StrategyError> {
    let doc_id = config::graphql_doc_id();
    let variables = format!(r#"{{"shortcode":"{shortcode}"}}"#);
    let body = form_urlencode(&[
        ("doc_id", doc_id.as_str()),
        ("variables", variables.as_str()),
        ("lsd", FB_LSD_TOKEN),
    ]);

    let client = browser_client(config::ASSET_TIMEOUT)?;
    let resp = client
        .post(GRAPHQL_ENDPOINT)
        .header(ACCEPT, "*/*")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("X-IG-App-ID", IG_APP_ID)
        .header("X-FB-LSD", FB_LSD_TOKEN)
        .header("X-ASBD-ID", FB_ASBD_ID)
        .header("X-Requested-With", "XMLHttpRequest")
        .header("Sec-Fetch-Site", "same-origin")
        .header("Sec-Fetch-Mode", "cors")
        .header("Sec-Fetch-Dest", "empty")
        .body(body)
        .send()?;

    let status = resp.status();
    if !status.is_success() {
        return Err(StrategyError::Status(status.as_u16()));
    }

    let text = resp.text()?;
    debug!(shortcode, len = text.len(), "graphql response received");
    parse_graphql_text(&text)
}

/// Pulls the post object out of the response body.
///
/// Login walls and `null` media objects (the datacenter-IP block signature)
/// are definitive empties; a body that is not JSON at all is a hard error and
/// worth a retry.
fn parse_graphql_text(text: &str) -> Result<Option<Value>, StrategyError> {
    if text.contains("require_login") || text.contains("not-logged-in") {
        debug!("graphql response requires login");
        return Ok(None);
    }

    let json: Value = serde_json::from_str(text)?;

    let Some(media) = json.get("data").and_then(|d| {
        d.get("xdt_shortcode_media")
            .or_else(|| d.get("shortcode_media"))
    }) else {
        return Ok(None);
    };

    if media.is_null() {
        debug!("graphql media object is null (likely IP-blocked)");
        return Ok(None);
    }

    Ok(Some(media.clone()))
}

/// Form URL encoding for key-value pairs.
fn form_urlencode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                url::form_urlencoded::byte_serialize(k.as_bytes()).collect::<String>(),
                url::form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>(),
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_xdt_shortcode_media() {
        let text = r#"{"data":{"xdt_shortcode_media":{"is_video":false,"display_url":"https://scontent.cdninstagram.com/v/a.jpg"}}}"#;
        let post = parse_graphql_text(text).unwrap().unwrap();
        assert_eq!(
            post["display_url"],
            "https://scontent.cdninstagram.com/v/a.jpg"
        );
    }

    #[test]
    fn parses_legacy_shortcode_media_key() {
        let text = r#"{"data":{"shortcode_media":{"is_video":true,"video_url":"https://scontent.cdninstagram.com/v/a.mp4"}}}"#;
        let post = parse_graphql_text(text).unwrap().unwrap();
        assert_eq!(post["is_video"], true);
    }

    #[test]
    fn null_media_object_is_empty_not_error() {
        let text = r#"{"data":{"xdt_shortcode_media":null}}"#;
        assert!(parse_graphql_text(text).unwrap().is_none());
    }

    #[test]
    fn login_wall_is_empty_not_error() {
        let text = r#"{"require_login":true}"#;
        assert!(parse_graphql_text(text).unwrap().is_none());
    }

    #[test]
    fn missing_data_key_is_empty() {
        let text = r#"{"status":"ok"}"#;
        assert!(parse_graphql_text(text).unwrap().is_none());
    }

    #[test]
    fn non_json_body_is_a_hard_error() {
        let text = "<html>blocked</html>";
        assert!(matches!(
            parse_graphql_text(text),
            Err(StrategyError::Parse(_))
        ));
    }

    #[test]
    fn form_urlencode_escapes_values() {
        let body = form_urlencode(&[("variables", r#"{"shortcode":"AB_c-1"}"#)]);
        assert_eq!(
            body,
            "variables=%7B%22shortcode%22%3A%22AB_c-1%22%7D"
        );
    }
}
