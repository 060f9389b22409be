pub mod metrics;
pub mod session;
pub mod toc;

pub use metrics::{
    calculate_reading_progress, estimate_reading_time, word_count, ElementGeometry,
    ScrollPosition, DEFAULT_WORDS_PER_MINUTE,
};
pub use session::{HeadlessSurface, ReadingSession, ScrollSurface};
pub use toc::{
    scroll_to_heading, HeadingNode, TableOfContentsItem, TocBuilder, Viewport,
    DEFAULT_SCROLL_OFFSET,
};

use crate::render::{headings_from_html, MarkdownRenderer};

/// Everything the reading view derives from one article's content.
#[derive(Debug, Clone)]
pub struct ReadingAids {
    pub html: String,
    pub headings: Vec<HeadingNode>,
    pub toc: Vec<TableOfContentsItem>,
    pub word_count: usize,
    pub reading_minutes: u32,
}

impl ReadingAids {
    pub fn prepare<R: MarkdownRenderer + ?Sized>(
        renderer: &R,
        markdown: &str,
        words_per_minute: u32,
    ) -> Self {
        let html = renderer.render_to_html(markdown);
        let mut headings = headings_from_html(&html);
        let toc = TocBuilder::new().build(&mut headings);

        Self {
            html,
            headings,
            toc,
            word_count: word_count(markdown),
            reading_minutes: estimate_reading_time(markdown, words_per_minute),
        }
    }

    /// Rebuild the outline against the already-identified headings.
    pub fn refresh_toc(&mut self) -> &[TableOfContentsItem] {
        self.toc = TocBuilder::new().build(&mut self.headings);
        &self.toc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HtmlRenderer;

    #[test]
    fn test_prepare_uses_renderer_anchors() {
        let md = "# Intro\n\nSome words here.\n\n## Setup\n\n### Setup";
        let aids = ReadingAids::prepare(&HtmlRenderer::new(), md, DEFAULT_WORDS_PER_MINUTE);

        let ids: Vec<_> = aids.toc.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "setup", "setup-1"]);
        let levels: Vec<_> = aids.toc.iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(aids.reading_minutes, 1);
    }

    #[test]
    fn test_refresh_toc_keeps_ids() {
        let md = "# One\n\n# Two";
        let mut aids = ReadingAids::prepare(&HtmlRenderer::new(), md, DEFAULT_WORDS_PER_MINUTE);
        let before = aids.toc.clone();
        assert_eq!(aids.refresh_toc(), before.as_slice());
    }

    #[test]
    fn test_empty_article() {
        let aids = ReadingAids::prepare(&HtmlRenderer::new(), "", DEFAULT_WORDS_PER_MINUTE);
        assert!(aids.toc.is_empty());
        assert_eq!(aids.reading_minutes, 0);
    }
}
