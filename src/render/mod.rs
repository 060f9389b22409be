//! Markdown to HTML, and back out to heading nodes.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::reading::toc::HeadingNode;

/// Renders Markdown for display. Implementations must be deterministic and
/// must never let embedded scripts through.
pub trait MarkdownRenderer: Send + Sync {
    fn render_to_html(&self, markdown: &str) -> String;
}

/// pulldown-cmark renderer with GitHub-flavoured extensions.
///
/// Raw HTML in the source is escaped and shown as text. Headings without an
/// explicit `{#id}` get a slug of their text as anchor.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options
    }
}

impl MarkdownRenderer for HtmlRenderer {
    fn render_to_html(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }

        let mut events: Vec<Event> = Parser::new_ext(markdown, Self::options())
            .map(|event| match event {
                Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
                other => other,
            })
            .collect();

        assign_heading_ids(&mut events);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut taken: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();
    let mut fallback_counter = 0usize;

    for start in 0..events.len() {
        let level = match &events[start] {
            Event::Start(Tag::Heading { id: None, level, .. }) => *level as usize,
            _ => continue,
        };

        let mut text = String::new();
        for event in &events[start + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        let base = match slugify_heading(&text) {
            slug if slug.is_empty() => {
                let fallback = format!("heading-h{level}-{fallback_counter}");
                fallback_counter += 1;
                fallback
            }
            slug => slug,
        };
        let id = unique_id(base, &taken);
        taken.insert(id.clone());

        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[start] {
            *slot = Some(CowStr::from(id));
        }
    }
}

fn unique_id(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Anchor slug for a heading's text: lowercase, punctuation dropped,
/// whitespace runs turned into single dashes.
pub fn slugify_heading(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lower, "");
    let dashed = WHITESPACE_RUN.replace_all(cleaned.trim(), "-");
    DASH_RUN.replace_all(&dashed, "-").into_owned()
}

static HEADING_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h([1-6])\b([^>]*)>(.*?)</h[1-6]\s*>").unwrap());
static ID_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Heading elements of rendered HTML, in document order.
pub fn headings_from_html(html: &str) -> Vec<HeadingNode> {
    HEADING_ELEMENT
        .captures_iter(html)
        .filter_map(|caps| {
            let level: u8 = caps.get(1)?.as_str().parse().ok()?;
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let inner = caps.get(3).map(|m| m.as_str()).unwrap_or("");

            let id = ID_ATTRIBUTE.captures(attrs).and_then(|id_caps| {
                id_caps
                    .get(1)
                    .or_else(|| id_caps.get(2))
                    .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
            });
            let stripped = TAG.replace_all(inner, "");
            let text = html_escape::decode_html_entities(&stripped).trim().to_string();

            Some(HeadingNode {
                level,
                text,
                id: id.filter(|id| !id.is_empty()),
            })
        })
        .collect()
}
