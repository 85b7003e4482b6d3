//! Error types for nbview.
//!
//! Library crates use [`NbViewError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbview operations.
#[derive(Debug, thiserror::Error)]
pub enum NbViewError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The notebook document could not be retrieved or parsed.
    #[error(transparent)]
    Load(#[from] NotebookLoadError),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failure while serializing rendered output.
    #[error("render error: {0}")]
    Render(String),

    /// Data validation error (bad argument, unsupported value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbViewError>;

impl NbViewError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// NotebookLoadError
// ---------------------------------------------------------------------------

/// A notebook could not be fetched or decoded.
///
/// Carries the attempted location and, for HTTP sources, the response status,
/// so the view can show a dedicated error state instead of an empty page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct NotebookLoadError {
    /// File path or URL that was attempted.
    pub path: String,
    /// HTTP status code, when the source was a URL and a response arrived.
    pub status: Option<u16>,
    /// Underlying reason (I/O error, network error, JSON error).
    pub reason: String,
}

impl NotebookLoadError {
    /// Failure without an HTTP status (file I/O, network, parse).
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: None,
            reason: reason.into(),
        }
    }

    /// Failure from a non-success HTTP response.
    pub fn with_status(path: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: Some(status),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for NotebookLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to load notebook {}: ", self.path)?;
        match self.status {
            Some(code) => write!(f, "HTTP {code}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}
