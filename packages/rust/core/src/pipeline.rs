//! End-to-end processing: document → filtered, rendered, sectioned notebook.

use tracing::{debug, info, instrument};

use nbview_highlight::{Highlighter, resolve_language};
use nbview_loader::{LoadOptions, NotebookSource, load_notebook};
use nbview_markdown::{Narrative, process_narrative};
use nbview_shared::{
    Cell, CellKind, NotebookDocument, PipelineConfig, ProcessedCell, ProcessedNotebook, Result,
    Summary,
};

use crate::output::render_output;
use crate::sections::Segmenter;

/// Run every stage over a loaded document.
///
/// Pure and synchronous: the same document and config always produce the
/// same result. Code cells are numbered 1, 2, 3, … over the cells that
/// survive filtering; the document's execution counts are ignored.
#[instrument(skip_all, fields(cells = doc.cells.len()))]
pub fn process_notebook(doc: &NotebookDocument, config: &PipelineConfig) -> ProcessedNotebook {
    let declared = doc.language();
    let language = resolve_language(declared.as_deref(), &config.default_language);
    let highlighter = Highlighter::new(language, config.palette.clone());

    let mut segmenter = Segmenter::new(config.fallback);
    let mut summary = Summary::default();

    for (position, cell) in doc.cells.iter().enumerate() {
        match cell.kind {
            CellKind::Raw => debug!(position, "dropping raw cell"),
            CellKind::Markdown => match process_narrative(&cell.source, config.min_narrative_chars)
            {
                Narrative::Kept { cleaned, html } => {
                    summary.markdown_cells += 1;
                    segmenter.push_markdown(ProcessedCell::Markdown {
                        cleaned_text: cleaned,
                        html,
                    });
                }
                Narrative::Boilerplate { rule } => {
                    debug!(position, rule, "dropped narrative cell");
                }
                Narrative::Empty => debug!(position, "dropped empty narrative cell"),
            },
            CellKind::Code => {
                let Some(processed) =
                    process_code(cell, summary.code_cells + 1, &highlighter, config)
                else {
                    debug!(position, "dropping code cell with nothing to show");
                    continue;
                };
                summary.code_cells += 1;
                summary.output_records += cell.outputs.len();
                segmenter.push_code(&cell.source, processed);
            }
        }
    }

    let sections = segmenter.finish();
    info!(
        sections = sections.len(),
        code_cells = summary.code_cells,
        markdown_cells = summary.markdown_cells,
        output_records = summary.output_records,
        "notebook processed"
    );

    ProcessedNotebook {
        title: doc.title(),
        sections,
        summary,
    }
}

/// Load a notebook and process it.
pub async fn load_and_process(
    source: &NotebookSource,
    load: &LoadOptions,
    config: &PipelineConfig,
) -> Result<ProcessedNotebook> {
    let doc = load_notebook(source, load).await?;
    Ok(process_notebook(&doc, config))
}

fn process_code(
    cell: &Cell,
    index: usize,
    highlighter: &Highlighter<'_>,
    config: &PipelineConfig,
) -> Option<ProcessedCell> {
    let outputs: Vec<_> = cell
        .outputs
        .iter()
        .filter_map(|record| render_output(record, config.trust_html))
        .collect();

    let blank = cell.source.trim().is_empty();
    if blank && outputs.is_empty() {
        return None;
    }

    let lines = if blank {
        Vec::new()
    } else {
        highlighter.highlight(&cell.source)
    };

    Some(ProcessedCell::Code {
        index,
        source: cell.source.clone(),
        lines,
        outputs,
        output_records: cell.outputs.len(),
    })
}
