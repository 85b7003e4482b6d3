//! Notebook loading from a file path or an `http(s)` URL.
//!
//! This is the only asynchronous step: once [`load_notebook`] returns, the
//! document is fully in memory and processing is synchronous. Every failure
//! is reported as a [`NotebookLoadError`] carrying the attempted location.

use std::path::PathBuf;
use std::time::Duration;

use nbview_shared::{AppConfig, NotebookDocument, NotebookLoadError};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of redirects to follow for URL sources.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for notebook requests.
const USER_AGENT: &str = concat!("nbview/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// NotebookSource
// ---------------------------------------------------------------------------

/// Where a notebook comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookSource {
    Path(PathBuf),
    Url(Url),
}

impl NotebookSource {
    /// Interpret a CLI argument: `http://`/`https://` is a URL, anything else a path.
    pub fn parse(input: &str) -> Result<Self, NotebookLoadError> {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| NotebookLoadError::new(trimmed, format!("invalid URL: {e}")))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::Path(PathBuf::from(trimmed)))
        }
    }

    /// Display form used in errors and logs.
    pub fn location(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.to_string(),
        }
    }

    /// File stem used to name rendered output (`analysis.ipynb` → `analysis`).
    pub fn stem(&self) -> String {
        let last = match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            Self::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(String::from))
                .unwrap_or_default(),
        };
        let stem = last.strip_suffix(".ipynb").unwrap_or(&last);
        if stem.is_empty() {
            "notebook".to_string()
        } else {
            stem.to_string()
        }
    }
}

impl std::fmt::Display for NotebookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.location())
    }
}

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// Configuration for loading.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Largest accepted body in bytes.
    pub max_bytes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for LoadOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.loader.timeout_secs,
            max_bytes: config.loader.max_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Load and decode a notebook.
#[instrument(skip_all, fields(source = %source))]
pub async fn load_notebook(
    source: &NotebookSource,
    opts: &LoadOptions,
) -> Result<NotebookDocument, NotebookLoadError> {
    let body = match source {
        NotebookSource::Path(path) => read_file(source, path, opts).await?,
        NotebookSource::Url(url) => fetch_url(url, opts).await?,
    };

    debug!(bytes = body.len(), "notebook body read");

    let document = NotebookDocument::from_json(&body)
        .map_err(|e| NotebookLoadError::new(source.location(), format!("invalid JSON: {e}")))?;

    info!(cells = document.cells.len(), "notebook loaded");
    Ok(document)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn read_file(
    source: &NotebookSource,
    path: &std::path::Path,
    opts: &LoadOptions,
) -> Result<String, NotebookLoadError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| NotebookLoadError::new(source.location(), e.to_string()))?;

    if metadata.len() > opts.max_bytes {
        return Err(NotebookLoadError::new(
            source.location(),
            format!("file too large ({} bytes, max {})", metadata.len(), opts.max_bytes),
        ));
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NotebookLoadError::new(source.location(), e.to_string()))
}

/// Build a reqwest client with appropriate settings.
fn build_client(url: &Url, opts: &LoadOptions) -> Result<Client, NotebookLoadError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| NotebookLoadError::new(url.as_str(), format!("failed to build HTTP client: {e}")))
}

async fn fetch_url(url: &Url, opts: &LoadOptions) -> Result<String, NotebookLoadError> {
    let client = build_client(url, opts)?;

    let mut response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| NotebookLoadError::new(url.as_str(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NotebookLoadError::with_status(
            url.as_str(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        ));
    }

    if let Some(len) = response.content_length() {
        if len > opts.max_bytes {
            return Err(too_large(url, len, opts.max_bytes));
        }
    }

    // Chunked responses carry no length up front; stop reading at the cap.
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| NotebookLoadError::new(url.as_str(), format!("failed to read body: {e}")))?
    {
        append_capped(&mut body, &chunk, opts.max_bytes)
            .map_err(|seen| too_large(url, seen, opts.max_bytes))?;
    }

    String::from_utf8(body)
        .map_err(|e| NotebookLoadError::new(url.as_str(), format!("response is not UTF-8: {e}")))
}

/// Append `chunk` unless the total would exceed `max`; on overflow returns
/// the byte count that would have been reached.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], max: u64) -> Result<(), u64> {
    let total = (body.len() + chunk.len()) as u64;
    if total > max {
        return Err(total);
    }
    body.extend_from_slice(chunk);
    Ok(())
}

fn too_large(url: &Url, len: u64, max: u64) -> NotebookLoadError {
    NotebookLoadError::new(
        url.as_str(),
        format!("response too large ({len} bytes, max {max})"),
    )
}
