//! Section segmentation.
//!
//! Code cells are labelled by content signature; adjacent cells sharing a
//! label are merged into one [`Section`]. Narrative cells never change the
//! label: they join whichever section is open.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use nbview_shared::{FallbackPolicy, ProcessedCell, Section};

/// Section labels in priority order.
pub const SECTION_LABELS: [&str; 7] = [
    "Setup & Imports",
    "Implementation",
    "Simulation Setup",
    "Results & Visualization",
    "Correlation Analysis",
    "Calibration",
    "Validation",
];

/// Content signatures, one per entry of [`SECTION_LABELS`] and in the same
/// order.
const SIGNATURES: [(&str, &str); 7] = [
    ("imports", r"(?m)^\s*(?:import\s+\w|from\s+[\w.]+\s+import\s)"),
    ("definitions", r"(?m)^\s*(?:def|class)\s+\w+"),
    (
        "random-seed",
        r"\b(?:random\.seed|default_rng|manual_seed|set_seed)\s*\(",
    ),
    (
        "plotting",
        r"\b(?:plt|sns|ax|axes|fig)\.\w+\s*\(|\.plot\s*\(",
    ),
    ("correlation", r"\.corr\s*\(|\bcorrcoef\s*\(|\bcholesky\b"),
    (
        "calibration",
        r"\b(?:brentq|fsolve|newton|bisect|root_scalar|minimize|least_squares|curve_fit)\s*\(|\bcalibrat",
    ),
    (
        "validation",
        r#"(?im)\bprint\s*\(\s*f?["'][^"'\n]*\b(?:valid\w*|check\w*|verif\w*|match\w*|pass\w*)|^\s*assert\s"#,
    ),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("valid regex")))
        .collect()
});

/// Index into [`SECTION_LABELS`] of the highest-priority matching signature.
pub fn classify_code(source: &str) -> Option<usize> {
    COMPILED.iter().position(|(name, re)| {
        let hit = re.is_match(source);
        if hit {
            trace!(signature = *name, "code cell matched signature");
        }
        hit
    })
}

/// Groups processed cells into labelled sections in document order.
#[derive(Debug)]
pub struct Segmenter {
    fallback: FallbackPolicy,
    last_label: Option<usize>,
    open_label: Option<usize>,
    sections: Vec<Section>,
}

impl Segmenter {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            fallback,
            last_label: None,
            open_label: None,
            sections: Vec::new(),
        }
    }

    /// Label a code cell and append it, opening a new section when the label
    /// differs from the open one.
    pub fn push_code(&mut self, source: &str, cell: ProcessedCell) {
        let label = classify_code(source).unwrap_or_else(|| self.fallback_label());
        self.last_label = Some(label);

        if self.open_label != Some(label) {
            self.sections.push(Section {
                title: SECTION_LABELS[label].to_string(),
                cells: Vec::new(),
            });
            self.open_label = Some(label);
        }
        self.current().cells.push(cell);
    }

    /// Append a narrative cell to the open section, or to an untitled lead-in.
    pub fn push_markdown(&mut self, cell: ProcessedCell) {
        if self.sections.is_empty() {
            self.sections.push(Section {
                title: String::new(),
                cells: Vec::new(),
            });
        }
        self.current().cells.push(cell);
    }

    pub fn finish(self) -> Vec<Section> {
        self.sections
    }

    fn fallback_label(&self) -> usize {
        match self.fallback {
            FallbackPolicy::RoundRobin => self
                .last_label
                .map_or(0, |i| (i + 1) % SECTION_LABELS.len()),
            FallbackPolicy::Previous => self.last_label.unwrap_or(0),
        }
    }

    fn current(&mut self) -> &mut Section {
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(index: usize, source: &str) -> ProcessedCell {
        ProcessedCell::Code {
            index,
            source: source.to_string(),
            lines: Vec::new(),
            outputs: Vec::new(),
            output_records: 0,
        }
    }

    fn md(text: &str) -> ProcessedCell {
        ProcessedCell::Markdown {
            cleaned_text: text.to_string(),
            html: format!("<p>{text}</p>"),
        }
    }

    fn segment(fallback: FallbackPolicy, sources: &[&str]) -> Vec<String> {
        let mut seg = Segmenter::new(fallback);
        for (i, src) in sources.iter().enumerate() {
            seg.push_code(src, code(i + 1, src));
        }
        seg.finish().into_iter().map(|s| s.title).collect()
    }

    #[test]
    fn signatures_map_to_labels() {
        let label = |src: &str| classify_code(src).map(|i| SECTION_LABELS[i]);
        assert_eq!(label("import pandas as pd"), Some("Setup & Imports"));
        assert_eq!(label("from scipy import stats"), Some("Setup & Imports"));
        assert_eq!(label("def foo(): pass"), Some("Implementation"));
        assert_eq!(label("class Model:\n    pass"), Some("Implementation"));
        assert_eq!(label("np.random.seed(0)"), Some("Simulation Setup"));
        assert_eq!(label("rng = np.random.default_rng(1)"), Some("Simulation Setup"));
        assert_eq!(label("iv = brentq(f, 0.01, 2.0)"), Some("Calibration"));
        assert_eq!(label("c = returns.corr()"), Some("Correlation Analysis"));
        assert_eq!(label("L = np.linalg.cholesky(c)"), Some("Correlation Analysis"));
        assert_eq!(label("print('Validation passed')"), Some("Validation"));
        assert_eq!(label("assert abs(a - b) < 1e-6"), Some("Validation"));
        assert_eq!(label("plt.plot(x)"), Some("Results & Visualization"));
        assert_eq!(label("df.plot(kind='bar')"), Some("Results & Visualization"));
        assert_eq!(label("x = 1"), None);
        assert_eq!(label("print(total)"), None);
    }

    #[test]
    fn highest_priority_wins() {
        let src = "import numpy as np\ndef f(x):\n    plt.plot(x)";
        assert_eq!(classify_code(src), Some(0));
        let src = "def f(x):\n    return brentq(g, 0, 1)";
        assert_eq!(classify_code(src), Some(1));
        let src = "iv = brentq(f, 0.01, 2.0)\nplt.plot(strikes, iv)";
        assert_eq!(
            classify_code(src).map(|i| SECTION_LABELS[i]),
            Some("Results & Visualization")
        );
        let src = "corr = rets.corr()\nprint('check: matrix is positive definite')";
        assert_eq!(
            classify_code(src).map(|i| SECTION_LABELS[i]),
            Some("Correlation Analysis")
        );
    }

    #[test]
    fn imports_definitions_plots_make_three_sections() {
        assert_eq!(
            segment(
                FallbackPolicy::RoundRobin,
                &["import pandas as pd", "def foo(): pass", "plt.plot(x)"]
            ),
            vec!["Setup & Imports", "Implementation", "Results & Visualization"]
        );
    }

    #[test]
    fn adjacent_same_label_cells_merge() {
        let mut seg = Segmenter::new(FallbackPolicy::RoundRobin);
        seg.push_code("import os", code(1, "import os"));
        seg.push_code("import sys", code(2, "import sys"));
        seg.push_code("def f(): pass", code(3, "def f(): pass"));
        let sections = seg.finish();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].cells.len(), 2);
        assert_eq!(sections[1].cells.len(), 1);
    }

    #[test]
    fn round_robin_fallback_advances_and_wraps() {
        assert_eq!(
            segment(FallbackPolicy::RoundRobin, &["x = 1", "y = 2"]),
            vec!["Setup & Imports", "Implementation"]
        );
        assert_eq!(
            segment(FallbackPolicy::RoundRobin, &["plt.show()", "total = a + b"]),
            vec!["Results & Visualization", "Correlation Analysis"]
        );
        assert_eq!(
            segment(FallbackPolicy::RoundRobin, &["assert ok", "total = a + b"]),
            vec!["Validation", "Setup & Imports"]
        );
    }

    #[test]
    fn previous_fallback_stays_put() {
        assert_eq!(
            segment(FallbackPolicy::Previous, &["def f(): pass", "y = f(2)", "z = y"]),
            vec!["Implementation"]
        );
        assert_eq!(
            segment(FallbackPolicy::Previous, &["x = 1"]),
            vec!["Setup & Imports"]
        );
    }

    #[test]
    fn markdown_joins_open_section_or_lead_in() {
        let mut seg = Segmenter::new(FallbackPolicy::RoundRobin);
        seg.push_markdown(md("Intro"));
        seg.push_code("import os", code(1, "import os"));
        seg.push_markdown(md("Notes on imports"));
        seg.push_code("import re", code(2, "import re"));
        let sections = seg.finish();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "");
        assert_eq!(sections[0].cells, vec![md("Intro")]);
        assert_eq!(sections[1].title, "Setup & Imports");
        assert_eq!(sections[1].cells.len(), 3);
    }

    #[test]
    fn lead_in_section_is_closed_by_first_code_cell() {
        let mut seg = Segmenter::new(FallbackPolicy::Previous);
        seg.push_markdown(md("Intro"));
        seg.push_code("x = 1", code(1, "x = 1"));
        let sections = seg.finish();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "Setup & Imports");
    }
}
