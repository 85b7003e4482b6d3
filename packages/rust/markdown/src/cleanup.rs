//! Line-level cleanup for narrative cells that survived boilerplate detection.
//!
//! Each pass is a function `&str -> String` applied in sequence. Unlike the
//! whole-cell rules, these only remove the offending lines and keep the
//! analyst's own commentary around them.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use nbview_shared::text::{looks_like_markup, strip_markup_tags, visible_chars};

/// Run the full cleanup pipeline on raw narrative text.
///
/// Passes repeat until the text stops changing: dropping noise lines can
/// leave a remainder that is markup-dominant, and stripping markup can
/// expose new noise lines. Every pass that changes the text shortens it, so
/// the loop ends and the result is a fixed point.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let reduced = reduce_markup(text);
    let filtered = drop_noise_lines(&reduced);
    filtered.trim().to_string()
}

/// True when cleaned text has more than `min_chars` visible characters.
pub(crate) fn has_substance(cleaned: &str, min_chars: usize) -> bool {
    visible_chars(cleaned) > min_chars
}

// ---------------------------------------------------------------------------
// Pass 1: Reduce markup-dominant cells to text
// ---------------------------------------------------------------------------

fn reduce_markup(text: &str) -> String {
    if looks_like_markup(text) {
        strip_markup_tags(text)
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Drop noise lines
// ---------------------------------------------------------------------------

/// Optional heading hashes and bold markers in front of a label.
const LEAD: &str = r"^\s*(?:#{1,6}\s*)?(?:\*\*|__)?\s*";

/// Line-level noise rules as `(name, pattern)`; `{LEAD}` is substituted.
const NOISE_RULES: &[(&str, &str)] = &[
    ("question-number", r"{LEAD}q\.?\s*no\b\.?"),
    ("sub-question", r"{LEAD}\d+\.\d+\s"),
    ("task-number", r"{LEAD}task\s*\d+\b"),
    (
        "bare-label",
        r"{LEAD}(?:answers?|instructions?|hints?|notes?)\s*:?\s*(?:\*\*|__)?\s*:?\s*$",
    ),
    ("divider", r"^\s*(?:-{3,}|\*{3,}|_{3,}|={3,})\s*$"),
    (
        "imperative-heading",
        r"^\s*#{1,6}\s*(?:\*\*|__)?\s*(?:write|using|calculate|plot|explain|compare|how\s+does|create\s+a|compute|implement|describe|discuss|estimate|simulate|show\s+that)\b",
    ),
];

static NOISE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    NOISE_RULES
        .iter()
        .map(|(name, pattern)| {
            let re = RegexBuilder::new(&pattern.replace("{LEAD}", LEAD))
                .case_insensitive(true)
                .build()
                .expect("valid regex");
            (*name, re)
        })
        .collect()
});

/// Name of the first noise rule matching a single line.
pub(crate) fn noise_rule(line: &str) -> Option<&'static str> {
    NOISE
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(name, _)| *name)
}

fn drop_noise_lines(text: &str) -> String {
    text.lines()
        .filter(|line| match noise_rule(line) {
            Some(rule) => {
                tracing::trace!(rule, line, "dropping noise line");
                false
            }
            None => true,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_heading_is_stripped() {
        assert_eq!(
            run_pipeline("#### Q.No.1\nThis is my analysis."),
            "This is my analysis."
        );
    }

    #[test]
    fn question_number_variants() {
        assert_eq!(noise_rule("QNo. 3"), Some("question-number"));
        assert_eq!(noise_rule("**Q No 2**"), Some("question-number"));
        assert_eq!(noise_rule("Q. Nobody expected this"), None);
    }

    #[test]
    fn sub_question_and_task_lines() {
        assert_eq!(noise_rule("### 2.1 Pricing the option"), Some("sub-question"));
        assert_eq!(noise_rule("## Task 4"), Some("task-number"));
        assert_eq!(noise_rule("Tasks remain open"), None);
    }

    #[test]
    fn bare_labels_only_when_alone() {
        assert_eq!(noise_rule("**Answer:**"), Some("bare-label"));
        assert_eq!(noise_rule("### Instructions"), Some("bare-label"));
        assert_eq!(noise_rule("Hint"), Some("bare-label"));
        assert_eq!(noise_rule("Note: the data starts in 2010."), None);
    }

    #[test]
    fn dividers_are_dropped() {
        assert_eq!(noise_rule("---"), Some("divider"));
        assert_eq!(noise_rule("  *****  "), Some("divider"));
        assert_eq!(noise_rule("-- not a rule"), None);
    }

    #[test]
    fn imperative_headings_need_heading_marker() {
        assert_eq!(
            noise_rule("### Write a function that prices the call"),
            Some("imperative-heading")
        );
        assert_eq!(noise_rule("## How does volatility affect price?"), Some("imperative-heading"));
        assert_eq!(noise_rule("#### Create a histogram"), Some("imperative-heading"));
        assert_eq!(
            noise_rule("Using the calibrated model, prices fall as rates rise."),
            None
        );
        assert_eq!(noise_rule("## Results"), None);
        assert_eq!(noise_rule("## Use of leverage"), None);
        assert_eq!(noise_rule("### Using the calibrated vols"), Some("imperative-heading"));
    }

    #[test]
    fn markup_dominant_cells_are_reduced() {
        assert_eq!(run_pipeline("<div>Result: <b>42</b></div>"), "Result: 42");
        assert_eq!(
            run_pipeline("Use x < y and y > z in the condition"),
            "Use x < y and y > z in the condition"
        );
    }

    #[test]
    fn cleanup_is_idempotent() {
        let inputs = [
            "#### Q.No.1\nThis is my analysis.",
            "## Task 2\n---\nThe estimate converges.\n\n**Answer:**\nIt is 0.42.",
            "  plain text with trailing space   ",
            "",
            "## Task 1 long explanatory heading text that sets up the exercise\n<b>x</b><i>y</i>",
            "<ul><li>Answer</li><li>The estimate converges</li></ul>",
        ];
        for input in inputs {
            let once = run_pipeline(input);
            assert_eq!(run_pipeline(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn markup_left_after_dropping_noise_is_reduced() {
        let input =
            "## Task 1 long explanatory heading text that sets up the exercise\n<b>x</b><i>y</i>";
        assert!(!looks_like_markup(input));
        assert_eq!(run_pipeline(input), "xy");
    }

    #[test]
    fn substance_threshold_is_exclusive() {
        assert!(!has_substance("0123456789", 10));
        assert!(has_substance("0123456789a", 10));
        assert!(!has_substance("a b c d e f g h i j", 10));
    }
}
