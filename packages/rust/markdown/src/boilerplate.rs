//! Whole-cell boilerplate detection.
//!
//! A narrative cell matching any rule here is pure assignment scaffolding
//! (course codes, submission instructions, panel wrappers, file naming) and is
//! dropped without further processing.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// A named content-shape rule.
struct Rule {
    name: &'static str,
    pattern: &'static str,
}

/// Whole-cell drop rules. Every pattern is matched case-insensitively.
const DROP_RULES: &[Rule] = &[
    Rule {
        name: "course-code",
        pattern: r"\b[a-z]{2,4}\d{4}\b",
    },
    Rule {
        name: "submit-instructions",
        pattern: r"\bsubmit\s+(?:your|the|this)\s+(?:assignment|notebook|work|file|solution)",
    },
    Rule {
        name: "credit-instructions",
        pattern: r"\bto\s+(?:receive|get|earn)\s+(?:full\s+|any\s+)?(?:credit|marks)",
    },
    Rule {
        name: "restart-run-all",
        pattern: r"\brestart\s*(?:&|&amp;|and)\s*run\s+all",
    },
    Rule {
        name: "grading-rubric",
        pattern: r"\b(?:grading\s+(?:rubric|criteria)|marking\s+scheme)\b",
    },
    Rule {
        name: "panel-wrapper",
        pattern: r#"<div\s+class\s*=\s*["']?[^"'>]*\b(?:alert|panel|well|jumbotron)\b"#,
    },
    Rule {
        name: "file-naming",
        pattern: r"\b(?:rename|name|save)\s+(?:your|this|the)\s+(?:file|notebook)\b",
    },
    Rule {
        name: "file-sequencing",
        pattern: r"\bfile\s*name\s+(?:should|must|format)\b",
    },
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DROP_RULES
        .iter()
        .map(|rule| {
            let re = RegexBuilder::new(rule.pattern)
                .case_insensitive(true)
                .build()
                .expect("valid regex");
            (rule.name, re)
        })
        .collect()
});

/// Name of the first rule the text matches, if any.
pub fn matching_rule(text: &str) -> Option<&'static str> {
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
}

/// True when the whole cell should be dropped.
pub fn is_boilerplate(text: &str) -> bool {
    matching_rule(text).is_some()
}
