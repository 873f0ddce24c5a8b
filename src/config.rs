//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `site.toml` lives in the project root (the directory passed as `--root`).
//! Every path inside it is relative to that root.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [dirs]
//! input = "."               # Where templates are discovered
//! output = "_site"          # Where the built site is written
//! includes = "_includes"    # Includable partials (relative to input)
//! data = "_data"            # Global data files (relative to input)
//!
//! [images]
//! output_dir = "_site/img/" # Where optimized images are written
//! url_path = "/img/"        # Public URL prefix for optimized images
//! quality = 80              # WebP quality (1-100)
//! widths = []               # Target widths; empty = original width only
//!
//! [templates]
//! formats = ["html", "md"]
//! ignore = ["node_modules", "README.md"]
//!
//! [passthrough]
//! paths = ["css", "js", "images", "fonts"]
//!
//! [css]
//! source = "css/style.css"
//! output = "css/style.min.css"
//! command = ["cleancss", "-o", "{output}", "{input}"]
//! background = false        # Run the minifier on a background thread
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file within the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have defaults matching a conventional layout
/// (`_site` output, `_includes`, `_data`, `css/js/images/fonts` copied as-is).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Input/output directory layout.
    pub dirs: DirsConfig,
    /// Image helper settings (output location, URL prefix, quality, widths).
    pub images: ImagesConfig,
    /// Which files are rendered as templates.
    pub templates: TemplatesConfig,
    /// Paths copied verbatim into the output.
    pub passthrough: PassthroughConfig,
    /// Pre-build CSS minification.
    pub css: CssConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.url_path.is_empty() {
            return Err(ConfigError::Validation(
                "images.url_path must not be empty".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths values must be non-zero".into(),
            ));
        }
        if self.css.command.is_empty() {
            return Err(ConfigError::Validation(
                "css.command must name a program".into(),
            ));
        }
        if self.templates.formats.is_empty() {
            return Err(ConfigError::Validation(
                "templates.formats must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsConfig {
    /// Template input directory, relative to the project root.
    pub input: String,
    /// Site output directory, relative to the project root.
    pub output: String,
    /// Partials directory, relative to `input`.
    pub includes: String,
    /// Global data directory, relative to `input`.
    pub data: String,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            input: ".".to_string(),
            output: "_site".to_string(),
            includes: "_includes".to_string(),
            data: "_data".to_string(),
        }
    }
}

/// Image helper settings.
///
/// The target format is always WebP; only placement and quality vary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory for optimized images, relative to the project root.
    pub output_dir: String,
    /// URL prefix the optimized images are served under.
    pub url_path: String,
    /// WebP encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Target widths. Empty means a single rendition at the original width.
    pub widths: Vec<u32>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            output_dir: "_site/img/".to_string(),
            url_path: "/img/".to_string(),
            quality: 80,
            widths: Vec::new(),
        }
    }
}

/// Template discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// File extensions rendered as templates.
    pub formats: Vec<String>,
    /// File or directory names never rendered, at any depth.
    pub ignore: Vec<String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            formats: vec!["html".to_string(), "md".to_string()],
            ignore: vec!["node_modules".to_string(), "README.md".to_string()],
        }
    }
}

/// Passthrough copy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PassthroughConfig {
    /// Files or directories (relative to `dirs.input`) copied verbatim.
    pub paths: Vec<String>,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            paths: ["css", "js", "images", "fonts"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Pre-build CSS minification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    /// Stylesheet to minify, relative to `dirs.input`.
    pub source: String,
    /// Minified output, relative to `dirs.input`.
    pub output: String,
    /// Minifier invocation. `{input}` and `{output}` are substituted.
    pub command: Vec<String>,
    /// Run the minifier on a background thread while pages render.
    pub background: bool,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            source: "css/style.css".to_string(),
            output: "css/style.min.css".to_string(),
            command: ["cleancss", "-o", "{output}", "{input}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            background: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Absolute-ish paths for a project, resolved against its root once.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub includes: PathBuf,
    pub data: PathBuf,
    pub image_output: PathBuf,
}

impl SitePaths {
    pub fn resolve(root: &Path, config: &SiteConfig) -> Self {
        let input = root.join(&config.dirs.input);
        Self {
            output: root.join(&config.dirs.output),
            includes: input.join(&config.dirs.includes),
            data: input.join(&config.dirs.data),
            image_output: root.join(&config.images.output_dir),
            input,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the given project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(root)?)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitekit configuration
# =====================
# Every key is optional. Values shown are the defaults.
# All paths are relative to the project root unless noted.

[dirs]
# Directory scanned for templates.
input = "."
# Directory the built site is written to.
output = "_site"
# Partials available to {% include %}, relative to `input`.
includes = "_includes"
# Global data files (*.json, *.toml), relative to `input`.
data = "_data"

[images]
# Where optimized WebP renditions are written.
output_dir = "_site/img/"
# Public URL prefix for optimized images.
url_path = "/img/"
# WebP quality, 1-100.
quality = 80
# Target widths in pixels. Empty = one rendition at the original width.
widths = []

[templates]
# Extensions rendered as templates. Markdown is rendered, then converted.
formats = ["html", "md"]
# Names skipped at any depth.
ignore = ["node_modules", "README.md"]

[passthrough]
# Copied verbatim into the output, relative to `dirs.input`.
paths = ["css", "js", "images", "fonts"]

[css]
# Stylesheet minified before the build, relative to `dirs.input`.
source = "css/style.css"
output = "css/style.min.css"
# Minifier invocation; {input} and {output} are substituted.
command = ["cleancss", "-o", "{output}", "{input}"]
# Run the minifier on a background thread while pages render.
background = false

[processing]
# Maximum parallel render workers. Omit for auto (= CPU cores).
# max_processes = 4
"##
}
