//! Syntax highlighting for code cells.
//!
//! [`Tokenizer`] splits a line into classified tokens using a [`Language`]
//! vocabulary; [`Highlighter`] turns those tokens into coloured HTML spans.

pub mod language;
pub mod tokenizer;

use nbview_shared::PaletteConfig;
use nbview_shared::text::escape_markup;
use tracing::debug;

pub use language::{Language, PYTHON};
pub use tokenizer::{Token, TokenClass, Tokenizer};

/// Markup for an empty line, so the row keeps its height.
pub const EMPTY_LINE: &str = "&nbsp;";

/// Renders code lines as HTML with per-class colours.
#[derive(Debug, Clone)]
pub struct Highlighter<'a> {
    tokenizer: Tokenizer<'a>,
    palette: PaletteConfig,
}

impl<'a> Highlighter<'a> {
    pub fn new(language: &'a Language, palette: PaletteConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(language),
            palette,
        }
    }

    /// Highlight every line of a cell's source.
    pub fn highlight(&self, source: &str) -> Vec<String> {
        source.lines().map(|line| self.highlight_line(line)).collect()
    }

    /// Highlight a single line.
    pub fn highlight_line(&self, line: &str) -> String {
        if line.is_empty() {
            return EMPTY_LINE.to_string();
        }

        let mut out = String::with_capacity(line.len() * 2);
        for token in self.tokenizer.tokenize(line) {
            let text = escape_markup(&token.text);
            match self.color(token.class) {
                Some(color) => {
                    out.push_str(&format!(r#"<span style="color:{color}">{text}</span>"#));
                }
                None => out.push_str(&text),
            }
        }
        out
    }

    fn color(&self, class: TokenClass) -> Option<&str> {
        let p = &self.palette;
        match class {
            TokenClass::Comment => Some(p.comment.as_str()),
            TokenClass::TripleString | TokenClass::String => Some(p.string.as_str()),
            TokenClass::Number => Some(p.number.as_str()),
            TokenClass::Keyword => Some(p.keyword.as_str()),
            TokenClass::Builtin => Some(p.builtin.as_str()),
            TokenClass::CapitalizedIdentifier => Some(p.class_name.as_str()),
            TokenClass::PlainText => None,
        }
    }
}

/// Resolve the vocabulary for a notebook: the declared kernel language if it
/// is known, else `fallback`, else Python.
pub fn resolve_language(declared: Option<&str>, fallback: &str) -> &'static Language {
    declared
        .and_then(Language::lookup)
        .or_else(|| Language::lookup(fallback))
        .unwrap_or_else(|| {
            debug!(?declared, fallback, "no known highlighting language, using python");
            &PYTHON
        })
}
