//! CLI command definitions, routing, and tracing setup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use nbview_core::{
    process_notebook, render_json, render_load_error, render_page, write_output,
};
use nbview_loader::{LoadOptions, NotebookSource, load_notebook};
use nbview_shared::{
    AppConfig, FallbackPolicy, NotebookLoadError, PipelineConfig, ProcessedCell,
    ProcessedNotebook, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbview: render notebooks without the coursework scaffolding.
#[derive(Parser)]
#[command(
    name = "nbview",
    version,
    about = "Render Jupyter notebooks as clean, sectioned, highlighted pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.nbview/nbview.toml.
    #[arg(long, env = "NBVIEW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Rendered output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render one or more notebooks.
    Render {
        /// Notebook paths or http(s) URLs.
        #[arg(required = true)]
        sources: Vec<String>,

        /// Directory for rendered files (stdout when omitted with a single source).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, default_value = "html")]
        format: OutputFormat,

        /// Section fallback for unrecognised code cells: round-robin or previous.
        #[arg(long)]
        fallback: Option<FallbackPolicy>,

        /// Escape text/html outputs instead of inserting them as markup.
        #[arg(long)]
        untrusted_html: bool,
    },

    /// Print the section outline and counters of a notebook.
    Inspect {
        /// Notebook path or http(s) URL.
        source: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbview=info",
        1 => "nbview=debug",
        _ => "nbview=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Render {
            sources,
            out_dir,
            format,
            fallback,
            untrusted_html,
        } => {
            let config = resolve_config(config_path.as_deref())?;
            let overrides = Overrides {
                fallback,
                untrusted_html,
            };
            cmd_render(&config, &overrides, &sources, out_dir.as_deref(), format).await
        }
        Command::Inspect { source } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_inspect(&config, &source).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// CLI flags that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    fallback: Option<FallbackPolicy>,
    untrusted_html: bool,
}

impl Overrides {
    fn apply(&self, config: &AppConfig) -> PipelineConfig {
        let mut pipeline = PipelineConfig::from(config);
        if let Some(fallback) = self.fallback {
            pipeline.fallback = fallback;
        }
        if self.untrusted_html {
            pipeline.trust_html = false;
        }
        pipeline
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// JSON record for one rendered source.
#[derive(Serialize)]
struct RenderReport<'a> {
    source: String,
    rendered_at: DateTime<Utc>,
    #[serde(flatten)]
    outcome: Outcome<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<'a> {
    Notebook(&'a ProcessedNotebook),
    Error {
        path: &'a str,
        status: Option<u16>,
        reason: &'a str,
    },
}

async fn cmd_render(
    config: &AppConfig,
    overrides: &Overrides,
    sources: &[String],
    out_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = overrides.apply(config);
    let load = LoadOptions::from(config);
    let to_stdout = out_dir.is_none() && sources.len() == 1;
    let out_dir = out_dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    info!(
        count = sources.len(),
        format = format.extension(),
        trust_html = pipeline.trust_html,
        "rendering notebooks"
    );

    let progress = if sources.len() > 1 {
        let bar = ProgressBar::new(sources.len() as u64);
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )?);
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut failures = 0usize;
    let mut stems = HashSet::new();
    for input in sources {
        progress.set_message(input.clone());

        let (stem, content) = match NotebookSource::parse(input) {
            Ok(source) => {
                let stem = source.stem();
                let content = match load_notebook(&source, &load).await {
                    Ok(doc) => {
                        let notebook = process_notebook(&doc, &pipeline);
                        render_success(input, &notebook, &stem, format)?
                    }
                    Err(err) => {
                        failures += 1;
                        warn!(%err, "notebook failed to load");
                        render_failure(input, &err, format)?
                    }
                };
                (stem, content)
            }
            Err(err) => {
                failures += 1;
                warn!(%err, "invalid notebook source");
                ("notebook".to_string(), render_failure(input, &err, format)?)
            }
        };

        if to_stdout {
            print!("{content}");
        } else {
            let stem = unique_stem(&mut stems, stem);
            let path = write_output(&out_dir, &stem, format.extension(), &content)?;
            progress.suspend(|| println!("  {input} -> {}", path.display()));
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if failures > 0 {
        return Err(eyre!(
            "{failures} of {} notebook(s) failed to load",
            sources.len()
        ));
    }
    Ok(())
}

/// Suffix repeated output names with `-2`, `-3`, … so one run never
/// overwrites its own earlier files.
fn unique_stem(taken: &mut HashSet<String>, stem: String) -> String {
    let mut candidate = stem.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{stem}-{n}");
    }
    if n > 1 {
        warn!(stem, renamed = %candidate, "output name repeated");
    }
    taken.insert(candidate.clone());
    candidate
}

fn render_success(
    input: &str,
    notebook: &ProcessedNotebook,
    stem: &str,
    format: OutputFormat,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Html => render_page(notebook, stem),
        OutputFormat::Json => render_json(&RenderReport {
            source: input.to_string(),
            rendered_at: Utc::now(),
            outcome: Outcome::Notebook(notebook),
        })?,
    })
}

fn render_failure(input: &str, err: &NotebookLoadError, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Html => render_load_error(err),
        OutputFormat::Json => render_json(&RenderReport {
            source: input.to_string(),
            rendered_at: Utc::now(),
            outcome: Outcome::Error {
                path: &err.path,
                status: err.status,
                reason: &err.reason,
            },
        })?,
    })
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

async fn cmd_inspect(config: &AppConfig, input: &str) -> Result<()> {
    let source = NotebookSource::parse(input)?;
    let doc = load_notebook(&source, &LoadOptions::from(config)).await?;
    let notebook = process_notebook(&doc, &PipelineConfig::from(config));

    println!();
    println!(
        "  {}",
        notebook.title.clone().unwrap_or_else(|| source.stem())
    );
    println!();
    print!("{}", outline(&notebook));
    println!();
    println!("  Code cells:      {}", notebook.summary.code_cells);
    println!("  Narrative cells: {}", notebook.summary.markdown_cells);
    println!("  Output records:  {}", notebook.summary.output_records);
    println!();

    Ok(())
}

/// One line per section, then one indented line per cell.
fn outline(notebook: &ProcessedNotebook) -> String {
    if notebook.is_empty() {
        return "  (no displayable content)\n".to_string();
    }

    let mut out = String::new();
    for section in &notebook.sections {
        let title = if section.title.is_empty() {
            "(untitled)"
        } else {
            section.title.as_str()
        };
        out.push_str(&format!("  {title}\n"));
        for cell in &section.cells {
            match cell {
                ProcessedCell::Code { index, outputs, .. } => {
                    out.push_str(&format!("    [{index}] code, {} output(s)\n", outputs.len()));
                }
                ProcessedCell::Markdown { cleaned_text, .. } => {
                    let preview: String = cleaned_text
                        .lines()
                        .next()
                        .unwrap_or_default()
                        .chars()
                        .take(60)
                        .collect();
                    out.push_str(&format!("        markdown: {preview}\n"));
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbview_shared::{Section, Summary};

    #[test]
    fn render_args_parse() {
        let cli = Cli::try_parse_from([
            "nbview",
            "render",
            "a.ipynb",
            "https://example.com/b.ipynb",
            "--out-dir",
            "site",
            "--format",
            "json",
            "--fallback",
            "previous",
            "--untrusted-html",
        ])
        .unwrap();

        match cli.command {
            Command::Render {
                sources,
                out_dir,
                format,
                fallback,
                untrusted_html,
            } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(out_dir, Some(PathBuf::from("site")));
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(fallback, Some(FallbackPolicy::Previous));
                assert!(untrusted_html);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn render_requires_a_source() {
        assert!(Cli::try_parse_from(["nbview", "render"]).is_err());
        assert!(
            Cli::try_parse_from(["nbview", "render", "a.ipynb", "--fallback", "nearest"]).is_err()
        );
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.sections.fallback = FallbackPolicy::RoundRobin;
        config.outputs.trust_html = true;

        let untouched = Overrides::default().apply(&config);
        assert_eq!(untouched.fallback, FallbackPolicy::RoundRobin);
        assert!(untouched.trust_html);

        let overridden = Overrides {
            fallback: Some(FallbackPolicy::Previous),
            untrusted_html: true,
        }
        .apply(&config);
        assert_eq!(overridden.fallback, FallbackPolicy::Previous);
        assert!(!overridden.trust_html);
    }

    #[test]
    fn repeated_stems_get_suffixes() {
        let mut taken = HashSet::new();
        let names: Vec<String> = ["hw", "hw", "notebook", "notebook", "hw", "hw-2"]
            .into_iter()
            .map(|s| unique_stem(&mut taken, s.to_string()))
            .collect();
        assert_eq!(names, vec!["hw", "hw-2", "notebook", "notebook-2", "hw-3", "hw-2-2"]);
    }

    #[test]
    fn json_error_record_shape() {
        let err = NotebookLoadError::with_status(
            "https://example.com/x.ipynb",
            500,
            "Internal Server Error",
        );
        let json = render_failure("https://example.com/x.ipynb", &err, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"]["status"], 500);
        assert_eq!(value["error"]["reason"], "Internal Server Error");
        assert!(value["rendered_at"].is_string());
    }

    #[test]
    fn outline_lists_sections_and_cells() {
        let notebook = ProcessedNotebook {
            title: None,
            sections: vec![Section {
                title: "Implementation".into(),
                cells: vec![ProcessedCell::Code {
                    index: 1,
                    source: "def f(): pass".into(),
                    lines: vec![],
                    outputs: vec![],
                    output_records: 0,
                }],
            }],
            summary: Summary::default(),
        };
        assert_eq!(outline(&notebook), "  Implementation\n    [1] code, 0 output(s)\n");

        let empty = ProcessedNotebook {
            title: None,
            sections: vec![],
            summary: Summary::default(),
        };
        assert!(outline(&empty).contains("no displayable content"));
    }
}
