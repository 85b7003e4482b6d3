//! Core domain types: the notebook document as loaded, and the processed
//! projection handed to the view.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// Decode a string-or-list-of-strings field into one string.
///
/// `null` and non-string list entries decode as empty.
fn de_multiline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(join_multiline).unwrap_or_default())
}

fn de_opt_multiline<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(join_multiline))
}

fn join_multiline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

/// Decode a list where each entry is decoded independently; entries that do
/// not fit `T` are skipped with a warning instead of failing the document.
fn de_lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(position, error = %e, "skipping malformed notebook entry");
                None
            }
        })
        .collect())
}

fn de_opt_index<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_u64))
}

// ---------------------------------------------------------------------------
// NotebookDocument
// ---------------------------------------------------------------------------

/// A loaded notebook: an ordered sequence of cells plus free-form metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookDocument {
    #[serde(default, deserialize_with = "de_lenient_seq")]
    pub cells: Vec<Cell>,

    #[serde(default)]
    pub metadata: Value,
}

impl NotebookDocument {
    /// Parse a notebook from its JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Kernel language declared in the metadata, lowercased.
    pub fn language(&self) -> Option<String> {
        self.metadata
            .pointer("/kernelspec/language")
            .or_else(|| self.metadata.pointer("/language_info/name"))
            .and_then(Value::as_str)
            .map(str::to_lowercase)
    }

    /// Title declared in the metadata, if any.
    pub fn title(&self) -> Option<String> {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    }
}

/// Cell kind as declared by `cell_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Code,
    Markdown,
    #[default]
    #[serde(other)]
    Raw,
}

/// One notebook cell. Missing fields decode as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cell {
    #[serde(rename = "cell_type", default)]
    pub kind: CellKind,

    #[serde(default, deserialize_with = "de_multiline")]
    pub source: String,

    #[serde(default, deserialize_with = "de_lenient_seq")]
    pub outputs: Vec<OutputRecord>,

    /// Carried for completeness; display numbering is recomputed.
    #[serde(rename = "execution_count", default, deserialize_with = "de_opt_index")]
    pub execution_index: Option<u64>,
}

/// A captured execution result, tagged by `output_type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum OutputRecord {
    Stream {
        #[serde(default, deserialize_with = "de_multiline")]
        text: String,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    ExecuteResult {
        #[serde(default)]
        data: MimeBundle,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default, deserialize_with = "de_lenient_seq")]
        traceback: Vec<String>,
    },
    /// Any `output_type` this viewer does not know about.
    #[serde(other)]
    Unknown,
}

/// The payloads of a display/execute result that this viewer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MimeBundle {
    #[serde(rename = "image/png", default, deserialize_with = "de_opt_multiline")]
    pub image_png: Option<String>,

    #[serde(rename = "text/html", default, deserialize_with = "de_opt_multiline")]
    pub html: Option<String>,

    #[serde(rename = "text/plain", default, deserialize_with = "de_opt_multiline")]
    pub plain_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Processed projection
// ---------------------------------------------------------------------------

/// Label shown above an output fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Output,
    Table,
    Result,
    Error,
    Image,
}

impl FragmentKind {
    /// Human-readable label, or `None` for unlabelled fragments.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Output => Some("Output"),
            Self::Table => Some("Table"),
            Self::Result => Some("Result"),
            Self::Error => Some("Error"),
            Self::Image => None,
        }
    }
}

/// Render-target markup for one output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFragment {
    pub kind: FragmentKind,
    pub html: String,
}

/// A cell that survived filtering, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProcessedCell {
    Markdown {
        cleaned_text: String,
        html: String,
    },
    Code {
        /// 1-based position among surviving code cells.
        index: usize,
        source: String,
        /// Highlighted markup, one entry per source line.
        lines: Vec<String>,
        outputs: Vec<OutputFragment>,
        /// Output records the cell carried in the document.
        #[serde(default)]
        output_records: usize,
    },
}

/// A contiguous, labelled run of processed cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Empty for an untitled lead-in section.
    pub title: String,
    pub cells: Vec<ProcessedCell>,
}

/// Counters reported alongside the sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub code_cells: usize,
    pub markdown_cells: usize,
    pub output_records: usize,
}

/// Result of one processing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedNotebook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub sections: Vec<Section>,
    pub summary: Summary,
}

impl ProcessedNotebook {
    /// True when nothing survived filtering ("no displayable content").
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate all processed cells in document order.
    pub fn cells(&self) -> impl Iterator<Item = &ProcessedCell> {
        self.sections.iter().flat_map(|s| s.cells.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_list_is_concatenated() {
        let json = r#"{"cells": [{"cell_type": "code", "source": ["import os\n", "print(1)"]}]}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        assert_eq!(doc.cells.len(), 1);
        assert_eq!(doc.cells[0].kind, CellKind::Code);
        assert_eq!(doc.cells[0].source, "import os\nprint(1)");
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let json = r#"{"cells": [{"cell_type": "code"}, {"source": null}]}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        assert_eq!(doc.cells.len(), 2);
        assert_eq!(doc.cells[0].source, "");
        assert!(doc.cells[0].outputs.is_empty());
        assert_eq!(doc.cells[1].kind, CellKind::Raw);
    }

    #[test]
    fn missing_cells_array_is_empty_document() {
        let doc = NotebookDocument::from_json(r#"{"nbformat": 4}"#).expect("parse");
        assert!(doc.cells.is_empty());
    }

    #[test]
    fn malformed_cell_is_skipped() {
        let json = r#"{"cells": [
            {"cell_type": "markdown", "source": "kept"},
            {"cell_type": 42},
            {"cell_type": "code", "source": "x = 1"}
        ]}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        assert_eq!(doc.cells.len(), 2);
        assert_eq!(doc.cells[1].source, "x = 1");
    }

    #[test]
    fn unknown_cell_type_is_raw() {
        let json = r#"{"cells": [{"cell_type": "heading", "source": "x"}]}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        assert_eq!(doc.cells[0].kind, CellKind::Raw);
    }

    #[test]
    fn outputs_decode_by_type() {
        let json = r#"{"cells": [{"cell_type": "code", "source": "", "execution_count": 7, "outputs": [
            {"output_type": "stream", "name": "stdout", "text": ["a\n", "b\n"]},
            {"output_type": "execute_result", "data": {"text/plain": ["42"], "text/html": "<b>42</b>"}},
            {"output_type": "display_data", "data": {"image/png": "iVBOR\nw0K"}},
            {"output_type": "error", "ename": "ValueError", "evalue": "bad", "traceback": ["line 1", "line 2"]},
            {"output_type": "update_display_data"},
            {"no_type": true}
        ]}]}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        let cell = &doc.cells[0];
        assert_eq!(cell.execution_index, Some(7));
        assert_eq!(cell.outputs.len(), 5);
        assert_eq!(
            cell.outputs[0],
            OutputRecord::Stream {
                text: "a\nb\n".into()
            }
        );
        match &cell.outputs[1] {
            OutputRecord::ExecuteResult { data } => {
                assert_eq!(data.plain_text.as_deref(), Some("42"));
                assert_eq!(data.html.as_deref(), Some("<b>42</b>"));
                assert!(data.image_png.is_none());
            }
            other => panic!("expected execute_result, got {other:?}"),
        }
        assert!(matches!(cell.outputs[3], OutputRecord::Error { ref traceback, .. } if traceback.len() == 2));
        assert_eq!(cell.outputs[4], OutputRecord::Unknown);
    }

    #[test]
    fn metadata_language_and_title() {
        let json = r#"{"cells": [], "metadata": {"kernelspec": {"language": "Python"}, "title": " Risk Model "}}"#;
        let doc = NotebookDocument::from_json(json).expect("parse");
        assert_eq!(doc.language().as_deref(), Some("python"));
        assert_eq!(doc.title().as_deref(), Some("Risk Model"));

        let doc = NotebookDocument::from_json(r#"{"cells": []}"#).expect("parse");
        assert!(doc.language().is_none());
        assert!(doc.title().is_none());
    }

    #[test]
    fn processed_cell_serializes_with_kind_tag() {
        let cell = ProcessedCell::Markdown {
            cleaned_text: "Hello".into(),
            html: "<p>Hello</p>".into(),
        };
        let json = serde_json::to_value(&cell).expect("serialize");
        assert_eq!(json["kind"], "markdown");
        assert_eq!(json["cleaned_text"], "Hello");
    }
}
