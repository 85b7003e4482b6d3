//! Shared types, error model, configuration, and text utilities for nbview.
//!
//! This crate is the foundation depended on by all other nbview crates.
//! It provides:
//! - [`NbViewError`] and [`NotebookLoadError`]: the error model
//! - Domain types ([`NotebookDocument`], [`Cell`], [`OutputRecord`], [`Section`], ...)
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)
//! - [`text`]: markup escaping and tag stripping

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CleaningConfig, FallbackPolicy, HighlightConfig, LoaderConfig, OutputsConfig,
    PaletteConfig, PipelineConfig, SectionsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{NbViewError, NotebookLoadError, Result};
pub use types::{
    Cell, CellKind, FragmentKind, MimeBundle, NotebookDocument, OutputFragment, OutputRecord,
    ProcessedCell, ProcessedNotebook, Section, Summary,
};
