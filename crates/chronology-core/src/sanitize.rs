//! Plain-text normalization for submitted action names.
//!
//! This strips markup and noise; it does not escape. Renderers escape on
//! output.

use regex::Regex;
use std::sync::OnceLock;

static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static OCTET_RE: OnceLock<Regex> = OnceLock::new();

fn script_re() -> &'static Regex {
    SCRIPT_RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap()
    })
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^<>]*>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn octet_re() -> &'static Regex {
    OCTET_RE.get_or_init(|| Regex::new(r"(?i)%[a-f0-9]{2}").unwrap())
}

/// Reduce `raw` to a single line of plain text.
///
/// Removes script/style blocks with their content, strips remaining tags,
/// drops control characters and percent-encoded octets, collapses runs of
/// whitespace to one space, and trims.
pub fn sanitize_text(raw: &str) -> String {
    let text = script_re().replace_all(raw, "");
    let text = tag_re().replace_all(&text, "");
    let text: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    // Stripping one octet can expose another ("%%4141" -> "%41").
    let mut text = text;
    while octet_re().is_match(&text) {
        text = octet_re().replace_all(&text, "").into_owned();
    }

    whitespace_re().replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_slug_is_untouched() {
        assert_eq!(sanitize_text("publish_post"), "publish_post");
    }

    #[test]
    fn tags_are_stripped() {
        assert_eq!(sanitize_text("<b>publish_post</b>"), "publish_post");
        assert_eq!(
            sanitize_text("publish<script>alert(1)</script>_post"),
            "publish_post"
        );
    }

    #[test]
    fn whitespace_and_newlines_collapse() {
        assert_eq!(sanitize_text("  publish \n\t post  "), "publish post");
    }

    #[test]
    fn octets_are_removed_repeatedly() {
        assert_eq!(sanitize_text("publish%20post"), "publishpost");
        assert_eq!(sanitize_text("a%%4141b"), "ab");
    }

    #[test]
    fn lone_angle_bracket_survives() {
        assert_eq!(sanitize_text("a < b"), "a < b");
    }

    #[test]
    fn markup_only_input_becomes_empty() {
        assert_eq!(sanitize_text("<em></em>"), "");
    }
}
