use std::collections::HashSet;

use serde::Serialize;

pub const DEFAULT_SCROLL_OFFSET: f64 = 100.0;

const GENERATED_ID_PREFIX: &str = "heading-";

/// A heading in a rendered document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    /// Rank, 1 for `<h1>` through 6 for `<h6>`.
    pub level: u8,
    /// Visible text.
    pub text: String,
    /// Anchor id, if the heading already carries one.
    pub id: Option<String>,
}

impl HeadingNode {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 6),
            text: text.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn existing_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Handle to the heading a TOC entry points at. Only meaningful for the
/// heading slice the entry was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOfContentsItem {
    pub id: String,
    pub text: String,
    pub level: u8,
    #[serde(skip)]
    pub element: ElementRef,
}

/// Builds the outline for one document pass.
///
/// Headings that already carry an id keep it. The rest get `heading-{n}`
/// from a counter local to the call, skipping any id already present in the
/// document, and the id is written back onto the node. Running the builder
/// again over the same nodes therefore yields the same ids.
#[derive(Debug, Default)]
pub struct TocBuilder;

impl TocBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, headings: &mut [HeadingNode]) -> Vec<TableOfContentsItem> {
        let mut taken: HashSet<String> = headings
            .iter()
            .filter_map(|h| h.existing_id().map(str::to_string))
            .collect();
        let mut counter = 0usize;
        let mut toc = Vec::with_capacity(headings.len());

        for (index, heading) in headings.iter_mut().enumerate() {
            let id = match heading.existing_id() {
                Some(id) => id.to_string(),
                None => {
                    let id = loop {
                        let candidate = format!("{GENERATED_ID_PREFIX}{counter}");
                        counter += 1;
                        if !taken.contains(&candidate) {
                            break candidate;
                        }
                    };
                    taken.insert(id.clone());
                    heading.id = Some(id.clone());
                    id
                }
            };

            toc.push(TableOfContentsItem {
                id,
                text: heading.text.clone(),
                level: heading.level,
                element: ElementRef(index),
            });
        }

        toc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// The scrollable surface a reading view is displayed on.
pub trait Viewport {
    /// Current vertical scroll offset of the document.
    fn scroll_y(&self) -> f64;
    /// Top edge of `element` relative to the visible window, if it exists.
    fn element_top(&self, element: ElementRef) -> Option<f64>;
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
}

/// Document position to scroll to so `item` sits `offset` pixels below the
/// top of the window.
pub fn scroll_target<V: Viewport + ?Sized>(
    viewport: &V,
    item: &TableOfContentsItem,
    offset: f64,
) -> Option<f64> {
    let relative_top = viewport.element_top(item.element)?;
    Some(relative_top + viewport.scroll_y() - offset)
}

/// Smooth-scroll `viewport` to `item`. Returns false when the element is
/// no longer on the surface.
pub fn scroll_to_heading<V: Viewport + ?Sized>(
    viewport: &mut V,
    item: &TableOfContentsItem,
    offset: f64,
) -> bool {
    match scroll_target(viewport, item, offset) {
        Some(top) => {
            tracing::debug!("Scrolling to heading {} at {}", item.id, top);
            viewport.scroll_to(top, ScrollBehavior::Smooth);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_ordered() {
        let mut headings = vec![
            HeadingNode::new(1, "A"),
            HeadingNode::new(2, "B"),
            HeadingNode::new(1, "A"),
        ];
        let toc = TocBuilder::new().build(&mut headings);

        let ids: Vec<_> = toc.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["heading-0", "heading-1", "heading-2"]);
        let texts: Vec<_> = toc.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "A"]);
        let levels: Vec<_> = toc.iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![1, 2, 1]);
    }

    #[test]
    fn test_existing_ids_are_reused() {
        let mut headings = vec![
            HeadingNode::new(1, "Intro").with_id("intro"),
            HeadingNode::new(2, "Details"),
        ];
        let toc = TocBuilder::new().build(&mut headings);
        assert_eq!(toc[0].id, "intro");
        assert_eq!(toc[1].id, "heading-0");
        assert_eq!(headings[1].id.as_deref(), Some("heading-0"));
    }

    #[test]
    fn test_generated_ids_skip_taken_ones() {
        let mut headings = vec![
            HeadingNode::new(2, "First"),
            HeadingNode::new(2, "Second").with_id("heading-0"),
        ];
        let toc = TocBuilder::new().build(&mut headings);
        assert_eq!(toc[0].id, "heading-1");
        assert_eq!(toc[1].id, "heading-0");
    }

    #[test]
    fn test_empty_id_counts_as_missing() {
        let mut headings = vec![HeadingNode::new(3, "X").with_id("")];
        let toc = TocBuilder::new().build(&mut headings);
        assert_eq!(toc[0].id, "heading-0");
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let builder = TocBuilder::new();
        let mut headings = vec![
            HeadingNode::new(1, "A"),
            HeadingNode::new(2, "B").with_id("b"),
            HeadingNode::new(2, "C"),
        ];
        let first = builder.build(&mut headings);
        let second = builder.build(&mut headings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_element_is_not_serialized() {
        let mut headings = vec![HeadingNode::new(1, "A")];
        let toc = TocBuilder::new().build(&mut headings);
        let json = serde_json::to_value(&toc[0]).unwrap();
        assert_eq!(json, serde_json::json!({"id": "heading-0", "text": "A", "level": 1}));
    }

    struct FakeViewport {
        scroll_y: f64,
        tops: Vec<f64>,
        requests: Vec<(f64, ScrollBehavior)>,
    }

    impl Viewport for FakeViewport {
        fn scroll_y(&self) -> f64 {
            self.scroll_y
        }

        fn element_top(&self, element: ElementRef) -> Option<f64> {
            self.tops.get(element.0).copied()
        }

        fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
            self.requests.push((top, behavior));
        }
    }

    #[test]
    fn test_scroll_to_heading_subtracts_offset() {
        let mut headings = vec![HeadingNode::new(1, "A"), HeadingNode::new(2, "B")];
        let toc = TocBuilder::new().build(&mut headings);
        let mut viewport = FakeViewport {
            scroll_y: 400.0,
            tops: vec![-300.0, 250.0],
            requests: Vec::new(),
        };

        assert!(scroll_to_heading(&mut viewport, &toc[1], DEFAULT_SCROLL_OFFSET));
        assert_eq!(viewport.requests, vec![(550.0, ScrollBehavior::Smooth)]);
    }

    #[test]
    fn test_scroll_to_missing_element() {
        let mut headings = vec![HeadingNode::new(1, "A")];
        let toc = TocBuilder::new().build(&mut headings);
        let mut viewport = FakeViewport {
            scroll_y: 0.0,
            tops: Vec::new(),
            requests: Vec::new(),
        };
        assert!(!scroll_to_heading(&mut viewport, &toc[0], 0.0));
        assert!(viewport.requests.is_empty());
    }
}
