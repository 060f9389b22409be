//! Word counts, reading time and scroll progress through an article.

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Whitespace-separated token count. Empty or blank text has no words.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Estimated minutes to read `content`, rounded up. Zero only for blank
/// content.
pub fn estimate_reading_time(content: &str, words_per_minute: u32) -> u32 {
    minutes_for(word_count(content) as u64, words_per_minute)
}

fn minutes_for(words: u64, words_per_minute: u32) -> u32 {
    let rate = u64::from(words_per_minute.max(1));
    u32::try_from(words.div_ceil(rate)).unwrap_or(u32::MAX)
}

/// Vertical placement of the article body in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry {
    pub top: f64,
    pub height: f64,
}

/// The visible window, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub scroll_top: f64,
    pub viewport_height: f64,
}

/// Percentage of the element the reader has scrolled through, in `[0, 100]`.
///
/// Zero until the viewport top reaches the element, 100 once the viewport
/// bottom passes the element's bottom, linear in between.
pub fn calculate_reading_progress(
    element_top: f64,
    element_height: f64,
    scroll_top: f64,
    viewport_height: f64,
) -> f64 {
    let scroll_bottom = scroll_top + viewport_height;
    let element_bottom = element_top + element_height;

    if scroll_top < element_top {
        return 0.0;
    }
    if scroll_bottom > element_bottom {
        return 100.0;
    }
    if element_height <= 0.0 {
        return 100.0;
    }

    let scrolled = scroll_bottom - element_top;
    (scrolled / element_height * 100.0).clamp(0.0, 100.0)
}

pub fn progress_for(element: ElementGeometry, position: ScrollPosition) -> f64 {
    calculate_reading_progress(
        element.top,
        element.height,
        position.scroll_top,
        position.viewport_height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(estimate_reading_time(&"word ".repeat(400), 200), 2);
        assert_eq!(estimate_reading_time(&"word ".repeat(401), 200), 3);
        assert_eq!(estimate_reading_time("one two three", 200), 1);
    }

    #[test]
    fn test_reading_time_for_blank_content_is_zero() {
        assert_eq!(estimate_reading_time("", 200), 0);
        assert_eq!(estimate_reading_time(" \n\t ", 200), 0);
    }

    #[test]
    fn test_reading_time_zero_rate_does_not_panic() {
        assert_eq!(estimate_reading_time("a b c", 0), 3);
    }

    #[test]
    fn test_reading_time_saturates() {
        assert_eq!(minutes_for(u64::MAX, 1), u32::MAX);
        assert_eq!(minutes_for(u64::from(u32::MAX) * 200, 200), u32::MAX);
        assert_eq!(minutes_for(u64::from(u32::MAX) * 200 + 1, 200), u32::MAX);
    }

    #[test]
    fn test_word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  a\tb\n\nc  "), 3);
    }

    #[test]
    fn test_progress_boundaries() {
        assert_eq!(calculate_reading_progress(100.0, 500.0, 0.0, 800.0), 0.0);
        assert_eq!(calculate_reading_progress(100.0, 500.0, 700.0, 800.0), 100.0);
    }

    #[test]
    fn test_progress_is_monotonic_inside_element() {
        // Tall element so the viewport bottom stays inside it.
        let mut last = 0.0;
        for step in 0..=20 {
            let scroll_top = 100.0 + f64::from(step) * 50.0;
            let p = calculate_reading_progress(100.0, 3000.0, scroll_top, 800.0);
            assert!(p > 0.0 && p <= 100.0);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_progress_midway() {
        // viewport bottom at 1100 over an element spanning 100..2100
        let p = calculate_reading_progress(100.0, 2000.0, 300.0, 800.0);
        assert!((p - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_zero_height_element() {
        assert_eq!(calculate_reading_progress(100.0, 0.0, 100.0, 0.0), 100.0);
    }
}
