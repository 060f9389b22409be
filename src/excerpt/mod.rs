//! Plain-text excerpts from raw Markdown.
//!
//! The stripping passes run in a fixed order, each one narrowing the syntax
//! left for the next. This is not a Markdown parser: unbalanced markers and
//! other constructs (lists, quotes, images) pass through untouched, and the
//! truncation is a hard character cut with no word-boundary handling.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_EXCERPT_LENGTH: usize = 150;

pub const ELLIPSIS: &str = "...";

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\r?\n\s*").unwrap());

/// Strip Markdown syntax and join lines, without truncating.
pub fn strip_markdown(content: &str) -> String {
    let text = HEADING.replace_all(content, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = LINE_BREAK.replace_all(&text, " ");
    text.trim().to_string()
}

/// Plain-text summary of at most `max_length` characters, followed by
/// [`ELLIPSIS`] when cut.
pub fn generate_excerpt(content: &str, max_length: usize) -> String {
    let plain = strip_markdown(content);

    if plain.chars().count() <= max_length {
        return plain;
    }

    let mut excerpt: String = plain.chars().take(max_length).collect();
    excerpt.push_str(ELLIPSIS);
    excerpt
}
