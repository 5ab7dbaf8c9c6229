use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::QuoteStyle;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteConfig {
    /// Frontmatter field naming the linked source text.
    #[serde(default = "default_source_field")]
    pub source_field: String,
    #[serde(default)]
    pub style: QuoteStyle,
    #[serde(default = "default_callout_header")]
    pub callout_header: String,
    /// Queries at or below this many characters match nothing.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_sample_chars")]
    pub sample_chars: usize,
    #[serde(default = "default_initial_sentences")]
    pub initial_sentences: usize,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            source_field: default_source_field(),
            style: QuoteStyle::default(),
            callout_header: default_callout_header(),
            min_query_chars: default_min_query_chars(),
            max_matches: default_max_matches(),
            preview_chars: default_preview_chars(),
            sample_chars: default_sample_chars(),
            initial_sentences: default_initial_sentences(),
        }
    }
}

fn default_source_field() -> String {
    "source_text".to_string()
}
fn default_callout_header() -> String {
    "> [!quote]".to_string()
}
fn default_min_query_chars() -> usize {
    5
}
fn default_max_matches() -> usize {
    5
}
fn default_preview_chars() -> usize {
    200
}
fn default_sample_chars() -> usize {
    5000
}
fn default_initial_sentences() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Vault-relative folder for imported notes. Empty means the vault root.
    #[serde(default)]
    pub location: String,
    /// Append a wikilink to the target note passed with `--into`.
    #[serde(default = "default_add_link")]
    pub add_link: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            add_link: default_add_link(),
        }
    }
}

fn default_add_link() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConvertConfig {
    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: String,
    #[serde(default = "default_convert_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            pandoc_path: default_pandoc_path(),
            timeout_secs: default_convert_timeout_secs(),
        }
    }
}

fn default_pandoc_path() -> String {
    "pandoc".to_string()
}
fn default_convert_timeout_secs() -> u64 {
    30
}

/// Default configuration written by `aq init`.
pub const EXAMPLE_CONFIG: &str = r#"# Air Quotes configuration.

[vault]
# Root of your note vault.
root = "."
include_globs = ["**/*.md"]
exclude_globs = []
follow_symlinks = false

[quote]
# Frontmatter field linking a note to its source text.
source_field = "source_text"
# Output style: callout, blockquote, or plain.
style = "callout"
callout_header = "> [!quote]"
# Queries at or below this many characters match nothing.
min_query_chars = 5
max_matches = 5
preview_chars = 200
sample_chars = 5000
initial_sentences = 5

[import]
# Vault-relative folder for imported books. Empty means the vault root.
location = "Imports"
add_link = true

[convert]
pandoc_path = "pandoc"
timeout_secs = 30
"#;

pub fn scaffold_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate quote settings
    if config.quote.max_matches < 1 {
        anyhow::bail!("quote.max_matches must be >= 1");
    }
    if config.quote.preview_chars < 1 {
        anyhow::bail!("quote.preview_chars must be >= 1");
    }
    if config.quote.sample_chars < config.quote.preview_chars {
        anyhow::bail!("quote.sample_chars must be >= quote.preview_chars");
    }
    if config.quote.initial_sentences < 1 {
        anyhow::bail!("quote.initial_sentences must be >= 1");
    }
    if config.quote.source_field.trim().is_empty() {
        anyhow::bail!("quote.source_field must not be empty");
    }

    // Validate convert settings
    if config.convert.timeout_secs == 0 {
        anyhow::bail!("convert.timeout_secs must be > 0");
    }

    Ok(config)
}
