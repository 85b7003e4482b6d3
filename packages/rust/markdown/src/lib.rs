//! Narrative-cell processing: boilerplate detection, cleanup, and rendering.
//!
//! A markdown cell goes through three stages:
//! 1. [`boilerplate`]: whole-cell rules that drop pure assignment scaffolding
//! 2. cleanup: markup reduction and line-level noise removal
//! 3. render: Markdown → HTML with math passthrough

pub mod boilerplate;
mod cleanup;
mod render;

use tracing::debug;

pub use boilerplate::{is_boilerplate, matching_rule};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Outcome of running one narrative cell through the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    /// Matched a whole-cell boilerplate rule.
    Boilerplate { rule: &'static str },
    /// Too little text left after cleanup.
    Empty,
    /// Survived; carries the cleaned text and its rendered HTML.
    Kept { cleaned: String, html: String },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Classify, clean and render one narrative cell.
///
/// `min_chars` is the visible-character count the cleaned text must exceed.
pub fn process_narrative(raw: &str, min_chars: usize) -> Narrative {
    if let Some(rule) = matching_rule(raw) {
        debug!(rule, "dropping boilerplate cell");
        return Narrative::Boilerplate { rule };
    }

    let cleaned = clean_markdown_text(raw);
    if !cleanup::has_substance(&cleaned, min_chars) {
        debug!(len = cleaned.len(), "dropping narrative cell with no substance");
        return Narrative::Empty;
    }

    let html = render_markdown(&cleaned);
    Narrative::Kept { cleaned, html }
}

/// Reduce markup-dominant text, drop noise lines, and trim.
pub fn clean_markdown_text(text: &str) -> String {
    cleanup::run_pipeline(text)
}

/// Render cleaned narrative text to an HTML fragment.
pub fn render_markdown(text: &str) -> String {
    render::render_markdown(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_code_drops_whole_cell() {
        let raw = "# FIN8002 Coursework\n\nThis paragraph is genuine and long enough.";
        assert_eq!(
            process_narrative(raw, 10),
            Narrative::Boilerplate {
                rule: "course-code"
            }
        );
    }

    #[test]
    fn noise_only_cell_is_empty() {
        assert_eq!(process_narrative("## Task 3\n---\n**Answer:**", 10), Narrative::Empty);
        assert_eq!(process_narrative("Short one", 10), Narrative::Empty);
    }

    #[test]
    fn kept_cell_carries_clean_text_and_html() {
        match process_narrative("#### Q.No.1\nThis is my analysis.", 10) {
            Narrative::Kept { cleaned, html } => {
                assert_eq!(cleaned, "This is my analysis.");
                assert_eq!(html, "<p>This is my analysis.</p>");
            }
            other => panic!("expected Kept, got {other:?}"),
        }
    }

    #[test]
    fn markup_cell_is_rendered_from_stripped_text() {
        match process_narrative("<div><p>The <b>call price</b> is 10.45</p></div>", 10) {
            Narrative::Kept { cleaned, html } => {
                assert_eq!(cleaned, "The call price is 10.45");
                assert!(!html.contains("<b>"));
            }
            other => panic!("expected Kept, got {other:?}"),
        }
    }

    #[test]
    fn threshold_is_configurable() {
        assert!(matches!(process_narrative("Short one", 3), Narrative::Kept { .. }));
    }
}
