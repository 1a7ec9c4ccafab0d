use url::Url;

/// Path segments that introduce a post shortcode.
const POST_SEGMENTS: [&str; 4] = ["p", "reel", "reels", "tv"];

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Leading run of shortcode characters in a path segment. A segment that got
/// query or fragment noise glued onto it still yields its code.
fn leading_code(segment: &str) -> Option<String> {
    let code: String = segment.chars().take_while(|c| is_code_char(*c)).collect();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Extracts the post shortcode from an arbitrary input URL.
///
/// Handles `/p/<code>/`, `/reel/<code>/`, `/reels/<code>/`, `/tv/<code>/`,
/// with or without trailing slashes, extra path segments, query strings, or a
/// leading username segment. Returns the first match. Inputs that do not
/// parse as absolute URLs are treated as bare paths.
pub fn extract_shortcode(input: &str) -> Option<String> {
    let path = match Url::parse(input) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => input.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (i, segment) in segments.iter().enumerate() {
        if POST_SEGMENTS.contains(segment) {
            if let Some(code) = segments.get(i + 1).and_then(|s| leading_code(s)) {
                return Some(code);
            }
        }
    }

    None
}

/// Comparison key for CDN URL deduplication.
///
/// The CDN attaches a rotating `se=` parameter, so the same asset shows up
/// under several URLs within one page. The key is the URL with that parameter
/// removed; every other parameter is stable per asset and kept. Returns the
/// input unchanged if it does not parse.
pub fn dedup_key(url_str: &str) -> String {
    let Ok(mut parsed) = Url::parse(url_str) else {
        return url_str.to_string();
    };

    let kept_params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "se")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept_params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&kept_params);
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- extract_shortcode ---

    #[test]
    fn extracts_from_p_path() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/ABC123/"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn extracts_from_reel_path() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reel/DEF456/"),
            Some("DEF456".to_string())
        );
    }

    #[test]
    fn extracts_from_reels_and_tv_paths() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reels/GHI789/"),
            Some("GHI789".to_string())
        );
        assert_eq!(
            extract_shortcode("https://www.instagram.com/tv/JKL012/"),
            Some("JKL012".to_string())
        );
    }

    #[test]
    fn extraction_ignores_query_decoration() {
        let plain = extract_shortcode("https://www.instagram.com/p/C9xYz_-1/");
        let decorated =
            extract_shortcode("https://www.instagram.com/p/C9xYz_-1/?igsh=MzRlODBiNWFlZA==&utm_source=qr");
        assert_eq!(plain, Some("C9xYz_-1".to_string()));
        assert_eq!(decorated, plain);
    }

    #[test]
    fn extraction_ignores_trailing_segments() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/ABC123/embed/captioned/"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn extracts_with_username_prefix() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/someuser/reel/B58TfHTnY2u/"),
            Some("B58TfHTnY2u".to_string())
        );
    }

    #[test]
    fn extracts_from_bare_path() {
        assert_eq!(extract_shortcode("/p/XYZ"), Some("XYZ".to_string()));
        assert_eq!(extract_shortcode("/p/XYZ?foo=1"), Some("XYZ".to_string()));
    }

    #[test]
    fn rejects_profile_url() {
        assert_eq!(extract_shortcode("https://www.instagram.com/cristiano/"), None);
    }

    #[test]
    fn rejects_unrecognized_path() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/explore/tags/cat/"),
            None
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(extract_shortcode(""), None);
        assert_eq!(extract_shortcode("/"), None);
    }

    #[test]
    fn rejects_marker_without_code() {
        assert_eq!(extract_shortcode("https://www.instagram.com/p/"), None);
    }

    // --- dedup_key ---

    #[test]
    fn dedup_key_strips_rotating_param() {
        let a = "https://scontent.cdninstagram.com/v/image.jpg?stp=dst-jpg&se=7";
        let b = "https://scontent.cdninstagram.com/v/image.jpg?stp=dst-jpg&se=8";
        assert_eq!(dedup_key(a), dedup_key(b));
        assert!(!dedup_key(a).contains("se="));
    }

    #[test]
    fn dedup_key_keeps_stable_params() {
        let key = dedup_key("https://scontent.cdninstagram.com/v/image.jpg?stp=dst-jpg&oh=abc&se=12");
        assert!(key.contains("stp=dst-jpg"));
        assert!(key.contains("oh=abc"));
    }

    #[test]
    fn dedup_key_is_idempotent() {
        let once = dedup_key("https://scontent.cdninstagram.com/v/image.jpg?se=3&stp=dst-jpg");
        assert_eq!(dedup_key(&once), once);
    }

    #[test]
    fn dedup_key_drops_query_when_only_rotating_param() {
        assert_eq!(
            dedup_key("https://scontent.cdninstagram.com/v/image.jpg?se=3"),
            "https://scontent.cdninstagram.com/v/image.jpg"
        );
    }

    #[test]
    fn dedup_key_returns_original_on_parse_failure() {
        assert_eq!(dedup_key("not-a-url"), "not-a-url");
    }
}
