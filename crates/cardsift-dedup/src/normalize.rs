use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static MARKUP_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// A whole escape chain such as `&amp;amp;lt;`, captured with the entity it
/// finally names, so nested escapes decode in one linear pass.
static ENTITY_CHAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:amp;)*(nbsp|lt|gt|amp);").unwrap());

/// Canonical comparison form of a rich-text field: markup stripped, common
/// entities decoded, whitespace collapsed, lowercased and trimmed.
///
/// Idempotent after a single pass: entity chains decode completely, and markup
/// exposed by decoding (`&lt;b&gt;`) is stripped again before whitespace is
/// collapsed.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = MARKUP_TAG_RE.replace_all(&lowered, " ");
    let decoded = ENTITY_CHAIN_RE.replace_all(&stripped, |caps: &Captures| match &caps[1] {
        "nbsp" => " ",
        "lt" => "<",
        "gt" => ">",
        _ => "&",
    });
    MARKUP_TAG_RE
        .replace_all(&decoded, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
