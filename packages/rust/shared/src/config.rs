//! Application configuration for nbview.
//!
//! User config lives at `~/.nbview/nbview.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbViewError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbview.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbview";

// ---------------------------------------------------------------------------
// Config structs (matching nbview.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Narrative-cell cleaning.
    #[serde(default)]
    pub cleaning: CleaningConfig,

    /// Execution-output rendering.
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// Section grouping.
    #[serde(default)]
    pub sections: SectionsConfig,

    /// Code highlighting.
    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Notebook loading.
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// `[cleaning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// A cleaned narrative cell is kept only if it has more non-whitespace
    /// characters than this.
    #[serde(default = "default_min_narrative_chars")]
    pub min_narrative_chars: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_narrative_chars: default_min_narrative_chars(),
        }
    }
}

fn default_min_narrative_chars() -> usize {
    10
}

/// `[outputs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// Insert `text/html` output payloads as markup. When false they are
    /// escaped and shown as text.
    #[serde(default = "default_true")]
    pub trust_html: bool,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self { trust_html: true }
    }
}

fn default_true() -> bool {
    true
}

/// What a code cell with no recognizable content signature is labelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Next label in priority order after the most recently used one.
    #[default]
    RoundRobin,
    /// Same label as the previous code cell.
    Previous,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = NbViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "round-robin" => Ok(Self::RoundRobin),
            "previous" => Ok(Self::Previous),
            other => Err(NbViewError::config(format!(
                "unknown section fallback '{other}' (expected 'round-robin' or 'previous')"
            ))),
        }
    }
}

/// `[sections]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionsConfig {
    /// Labelling policy for cells that match no signature.
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

/// `[highlight]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Vocabulary used when the notebook does not name its kernel language.
    #[serde(default = "default_language")]
    pub language: String,

    /// Colours per token class.
    #[serde(default)]
    pub palette: PaletteConfig,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            palette: PaletteConfig::default(),
        }
    }
}

fn default_language() -> String {
    "python".into()
}

/// `[highlight.palette]` section. Values are CSS colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default = "default_comment")]
    pub comment: String,
    #[serde(default = "default_string")]
    pub string: String,
    #[serde(default = "default_number")]
    pub number: String,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default = "default_builtin")]
    pub builtin: String,
    #[serde(default = "default_class_name")]
    pub class_name: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            comment: default_comment(),
            string: default_string(),
            number: default_number(),
            keyword: default_keyword(),
            builtin: default_builtin(),
            class_name: default_class_name(),
        }
    }
}

fn default_comment() -> String {
    "#6a9955".into()
}
fn default_string() -> String {
    "#ce9178".into()
}
fn default_number() -> String {
    "#b5cea8".into()
}
fn default_keyword() -> String {
    "#c586c0".into()
}
fn default_builtin() -> String {
    "#dcdcaa".into()
}
fn default_class_name() -> String {
    "#4ec9b0".into()
}

/// `[loader]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// HTTP timeout for URL sources.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest accepted notebook body in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_bytes() -> u64 {
    20 * 1024 * 1024
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Keep threshold for cleaned narrative cells.
    pub min_narrative_chars: usize,
    /// Whether HTML output payloads are inserted as markup.
    pub trust_html: bool,
    /// Section labelling fallback.
    pub fallback: FallbackPolicy,
    /// Language used when the notebook metadata names none.
    pub default_language: String,
    /// Highlight colours.
    pub palette: PaletteConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_narrative_chars: config.cleaning.min_narrative_chars,
            trust_html: config.outputs.trust_html,
            fallback: config.sections.fallback,
            default_language: config.highlight.language.clone(),
            palette: config.highlight.palette.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbview/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NbViewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbview/nbview.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbViewError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| NbViewError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Reject values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.loader.timeout_secs == 0 {
            return Err(NbViewError::validation("loader.timeout_secs must be at least 1"));
        }
        if self.loader.max_bytes == 0 {
            return Err(NbViewError::validation("loader.max_bytes must be at least 1"));
        }
        if self.highlight.language.trim().is_empty() {
            return Err(NbViewError::validation("highlight.language must not be empty"));
        }
        Ok(())
    }
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbViewError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbViewError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbViewError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("min_narrative_chars"));
        assert!(toml_str.contains("round-robin"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.cleaning.min_narrative_chars, 10);
        assert!(parsed.outputs.trust_html);
        assert_eq!(parsed.highlight.palette, PaletteConfig::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r##"
[sections]
fallback = "previous"

[highlight.palette]
keyword = "#ff0000"
"##;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sections.fallback, FallbackPolicy::Previous);
        assert_eq!(config.highlight.palette.keyword, "#ff0000");
        assert_eq!(config.highlight.palette.comment, "#6a9955");
        assert_eq!(config.loader.timeout_secs, 30);
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let mut app = AppConfig::default();
        app.outputs.trust_html = false;
        let pipeline = PipelineConfig::from(&app);
        assert_eq!(pipeline.min_narrative_chars, 10);
        assert!(!pipeline.trust_html);
        assert_eq!(pipeline.fallback, FallbackPolicy::RoundRobin);
        assert_eq!(pipeline.default_language, "python");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_loader_limits_are_rejected() {
        let dir = std::env::temp_dir().join(format!("nbview-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nbview.toml");
        std::fs::write(&path, "[loader]\nmax_bytes = 0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, NbViewError::Validation { .. }));
        assert!(err.to_string().contains("loader.max_bytes"));

        std::fs::remove_dir_all(&dir).unwrap();

        let mut config = AppConfig::default();
        config.highlight.language = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(NbViewError::Validation { .. })
        ));
    }

    #[test]
    fn fallback_policy_parses() {
        assert_eq!(
            "previous".parse::<FallbackPolicy>().unwrap(),
            FallbackPolicy::Previous
        );
        let err = "sideways".parse::<FallbackPolicy>().unwrap_err();
        assert!(err.to_string().contains("unknown section fallback"));
    }
}
