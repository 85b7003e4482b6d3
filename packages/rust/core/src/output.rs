//! Execution-output rendering.
//!
//! Maps one [`OutputRecord`] to at most one [`OutputFragment`]. Display and
//! execute results pick a single payload: image over HTML over plain text.

use std::sync::LazyLock;

use regex::Regex;

use nbview_shared::text::escape_markup;
use nbview_shared::{FragmentKind, MimeBundle, OutputFragment, OutputRecord};

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid regex"));

/// Render one output record, or `None` when it has nothing to show.
///
/// With `trust_html` set, `text/html` payloads are inserted as markup
/// verbatim. This is the single point where document content reaches the
/// page unescaped; sources that are not trusted must run with it off.
pub fn render_output(record: &OutputRecord, trust_html: bool) -> Option<OutputFragment> {
    match record {
        OutputRecord::Stream { text } => {
            non_blank(text).map(|text| labelled(FragmentKind::Output, preformatted(text)))
        }
        OutputRecord::DisplayData { data } | OutputRecord::ExecuteResult { data } => {
            render_bundle(data, trust_html)
        }
        OutputRecord::Error {
            ename,
            evalue,
            traceback,
        } => render_error(ename, evalue, traceback),
        OutputRecord::Unknown => None,
    }
}

fn render_bundle(data: &MimeBundle, trust_html: bool) -> Option<OutputFragment> {
    if let Some(png) = data.image_png.as_deref().and_then(non_blank) {
        let encoded: String = png.chars().filter(|c| !c.is_whitespace()).collect();
        return Some(OutputFragment {
            kind: FragmentKind::Image,
            html: format!(
                r#"<div class="nb-output nb-output-image"><img src="data:image/png;base64,{encoded}" alt="Cell output"></div>"#
            ),
        });
    }

    if let Some(html) = data.html.as_deref().and_then(non_blank) {
        let body = if trust_html {
            format!(r#"<div class="nb-html">{html}</div>"#)
        } else {
            preformatted(html)
        };
        return Some(labelled(FragmentKind::Table, body));
    }

    data.plain_text
        .as_deref()
        .and_then(non_blank)
        .map(|text| labelled(FragmentKind::Result, preformatted(text)))
}

fn render_error(ename: &str, evalue: &str, traceback: &[String]) -> Option<OutputFragment> {
    let joined = strip_ansi(&traceback.join("\n"));
    let text = if joined.trim().is_empty() {
        match (ename.trim(), evalue.trim()) {
            ("", "") => return None,
            (name, "") => name.to_string(),
            ("", value) => value.to_string(),
            (name, value) => format!("{name}: {value}"),
        }
    } else {
        joined
    };
    Some(labelled(FragmentKind::Error, preformatted(&text)))
}

/// Remove ANSI colour/control escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

fn non_blank(text: &str) -> Option<&str> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn preformatted(text: &str) -> String {
    format!("<pre>{}</pre>", escape_markup(text))
}

fn labelled(kind: FragmentKind, body: String) -> OutputFragment {
    let label = kind.label().unwrap_or_default();
    let class = label.to_lowercase();
    OutputFragment {
        kind,
        html: format!(
            r#"<div class="nb-output nb-output-{class}"><div class="nb-output-label">{label}</div>{body}</div>"#
        ),
    }
}
