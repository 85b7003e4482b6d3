//! Text utilities: markup escaping, tag stripping, and markup detection.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum number of opening tags before text can count as markup.
const MARKUP_MIN_TAGS: usize = 2;

/// Stripped text must be shorter than this fraction of the original.
const MARKUP_TEXT_RATIO: f64 = 0.6;

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

static BLOCK_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:p|div|li)\s*>").expect("valid regex"));

static LI_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li(?:\s[^>]*)?>").expect("valid regex"));

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z][^>]*>").expect("valid regex"));

/// Escape `&`, `<` and `>` as entity references.
///
/// Ampersand goes first so the entities produced for the other two are not
/// escaped again.
pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reduce an HTML fragment to plain text.
///
/// Line breaks and block closings become newlines, list items get a bullet
/// prefix, every other tag is removed and the common entities are decoded.
pub fn strip_markup_tags(s: &str) -> String {
    let text = BR_RE.replace_all(s, "\n");
    let text = BLOCK_CLOSE_RE.replace_all(&text, "\n");
    let text = LI_OPEN_RE.replace_all(&text, "• ");
    let text = ANY_TAG_RE.replace_all(&text, "");

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

/// True when `s` is mostly markup rather than prose: at least two opening
/// tags, and the stripped text is under 60% of the original length.
pub fn looks_like_markup(s: &str) -> bool {
    if OPEN_TAG_RE.find_iter(s).take(MARKUP_MIN_TAGS).count() < MARKUP_MIN_TAGS {
        return false;
    }

    let original = s.chars().count();
    let stripped = strip_markup_tags(s).chars().count();
    (stripped as f64) < (original as f64) * MARKUP_TEXT_RATIO
}

/// Number of non-whitespace characters in `s`.
pub fn visible_chars(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}
