//! Core pipeline orchestration for nbview.
//!
//! This crate ties together loading, narrative cleanup, highlighting, output
//! rendering and section segmentation into one pass (`process_notebook`),
//! and assembles the result into a standalone page.

pub mod output;
pub mod page;
pub mod pipeline;
pub mod sections;

pub use output::render_output;
pub use page::{render_json, render_load_error, render_page, write_output};
pub use pipeline::{load_and_process, process_notebook};
pub use sections::{SECTION_LABELS, Segmenter, classify_code};
