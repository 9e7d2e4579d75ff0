//! HTML flattening helpers.
//!
//! Two flavours: a light one for previews (tags out, whitespace collapsed)
//! and a stricter one for text handed to the language model (script and
//! style blocks dropped, common entities decoded).

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Replace every tag with a space and collapse whitespace runs.
///
/// Entities are left as-is.
pub fn strip_tags(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

/// Flatten HTML into plain text suitable for a prompt.
pub fn sanitize_html(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = strip_tags(&text);
    decode_entities(&text).trim().to_string()
}

/// Decode the handful of entities newsletters actually use.
///
/// `&amp;` goes last so `&amp;lt;` becomes a literal `&lt;`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
