//! Render-target assembly: a standalone HTML page per notebook, plus the
//! writers that put pages and JSON reports on disk.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use nbview_shared::text::escape_markup;
use nbview_shared::{NbViewError, NotebookLoadError, ProcessedCell, ProcessedNotebook, Result};

const STYLESHEET: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 960px; padding: 2rem 1rem; color: #1f2328; }
h1 { font-size: 1.75rem; margin-bottom: 0.5rem; }
.nb-summary { display: flex; gap: 1.5rem; color: #57606a; font-size: 0.9rem; margin-bottom: 2rem; }
.nb-section { margin-bottom: 2.5rem; }
.nb-section > h2 { border-bottom: 1px solid #d0d7de; padding-bottom: 0.3rem; }
.nb-code { display: flex; gap: 0.75rem; margin: 1rem 0 0.5rem; }
.nb-index { color: #8c959f; font-family: monospace; min-width: 2.5rem; text-align: right; }
.nb-source { background: #1e1e1e; color: #d4d4d4; border-radius: 6px; padding: 0.75rem 1rem; flex: 1; overflow-x: auto; font-family: monospace; font-size: 0.85rem; line-height: 1.45; }
.nb-line { white-space: pre; }
.nb-output { margin: 0.5rem 0 0.5rem 3.25rem; }
.nb-output pre { background: #f6f8fa; border-radius: 6px; padding: 0.5rem 0.75rem; overflow-x: auto; margin: 0; }
.nb-output-label { font-size: 0.75rem; text-transform: uppercase; color: #57606a; margin-bottom: 0.25rem; }
.nb-output-error pre { background: #fff1f0; color: #a40e26; }
.nb-output img { max-width: 100%; }
.nb-html { overflow-x: auto; }
.md-spacer { height: 0.5rem; }
.math-block { font-family: serif; text-align: center; margin: 0.75rem 0; }
.nb-empty, .nb-error { border: 1px solid #d0d7de; border-radius: 6px; padding: 1.5rem; text-align: center; color: #57606a; }
.nb-error { border-color: #ff8182; background: #fff1f0; color: #a40e26; text-align: left; }
"#;

/// Render a processed notebook as a standalone HTML document.
///
/// `name` titles the page when the notebook metadata carries no title.
pub fn render_page(notebook: &ProcessedNotebook, name: &str) -> String {
    let title = notebook.title.as_deref().unwrap_or(name);
    let mut body = String::new();

    let summary = &notebook.summary;
    let _ = write!(
        body,
        r#"<div class="nb-summary"><span>{} code cells</span><span>{} narrative cells</span><span>{} outputs</span></div>"#,
        summary.code_cells, summary.markdown_cells, summary.output_records
    );

    if notebook.is_empty() {
        body.push_str(r#"<div class="nb-empty">No displayable content</div>"#);
    }

    for section in &notebook.sections {
        body.push_str(r#"<section class="nb-section">"#);
        if !section.title.is_empty() {
            let _ = write!(body, "<h2>{}</h2>", escape_markup(&section.title));
        }
        for cell in &section.cells {
            render_cell(&mut body, cell);
        }
        body.push_str("</section>");
    }

    shell(title, &body)
}

/// Render the dedicated failure state for a notebook that could not be loaded.
pub fn render_load_error(error: &NotebookLoadError) -> String {
    let mut body = String::from(r#"<div class="nb-error"><strong>Could not load notebook</strong>"#);
    let _ = write!(body, "<p><code>{}</code></p>", escape_markup(&error.path));
    if let Some(status) = error.status {
        let _ = write!(body, "<p>HTTP status {status}</p>");
    }
    let _ = write!(body, "<p>{}</p></div>", escape_markup(&error.reason));
    shell("Notebook unavailable", &body)
}

/// Serialize any report as pretty JSON.
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| NbViewError::Render(format!("JSON serialization failed: {e}")))
}

/// Write `content` to `<dir>/<stem>.<ext>` via a temporary file and rename.
pub fn write_output(dir: &Path, stem: &str, ext: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| NbViewError::io(dir, e))?;

    let target = dir.join(format!("{stem}.{ext}"));
    let temp = dir.join(format!(".{stem}.{ext}.tmp"));
    std::fs::write(&temp, content).map_err(|e| NbViewError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| NbViewError::io(&target, e))?;

    debug!(path = %target.display(), size = content.len(), "wrote rendered output");
    Ok(target)
}

fn render_cell(out: &mut String, cell: &ProcessedCell) {
    match cell {
        ProcessedCell::Markdown { html, .. } => {
            let _ = write!(out, r#"<div class="nb-markdown">{html}</div>"#);
        }
        ProcessedCell::Code {
            index,
            lines,
            outputs,
            ..
        } => {
            if !lines.is_empty() {
                let _ = write!(
                    out,
                    r#"<div class="nb-code"><div class="nb-index">[{index}]</div><div class="nb-source">"#
                );
                for line in lines {
                    let _ = write!(out, r#"<div class="nb-line">{line}</div>"#);
                }
                out.push_str("</div></div>");
            }
            for fragment in outputs {
                out.push_str(&fragment.html);
            }
        }
    }
}

fn shell(title: &str, body: &str) -> String {
    let title = escape_markup(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLESHEET}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    )
}
