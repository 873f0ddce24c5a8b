//! Image processor: the collaborator behind the template helpers.
//!
//! Takes a cleaned asset path, produces WebP renditions in the image output
//! directory and returns their metadata ([`ImageStats`]). Each distinct path
//! is processed at most once per processor; concurrent requests for the same
//! path block on the first one and share its outcome, success or failure.

use crate::cache::{self, CacheCounters, CacheStats};
use crate::config::{SiteConfig, SitePaths};
use crate::imaging::{
    ImageBackend, Quality, VariantConfig, create_webp_variants, get_dimensions,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

/// The single error kind surfaced by processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("failed to process {path}: {message}")]
    Processing { path: PathBuf, message: String },
}

impl ImageError {
    fn processing(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Processing {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Metadata for one generated rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub filename: String,
    pub output_path: PathBuf,
    /// Encoded size in bytes.
    pub size: u64,
    pub source_type: String,
}

/// Renditions produced for one source, in ascending width order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStats {
    pub webp: Vec<Variant>,
}

impl ImageStats {
    /// The smallest rendition; with the default config, the only one.
    pub fn primary(&self) -> Option<&Variant> {
        self.webp.first()
    }

    /// The largest rendition, used for the `src`/`width`/`height` of a tag.
    pub fn largest(&self) -> Option<&Variant> {
        self.webp.last()
    }

    /// `srcset` value (`url 400w, url 800w`), or `None` for a single rendition.
    pub fn srcset(&self) -> Option<String> {
        if self.webp.len() < 2 {
            return None;
        }
        Some(
            self.webp
                .iter()
                .map(|v| format!("{} {}w", v.url, v.width))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Fixed processing options, resolved from config once per build.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Cleaned asset paths are resolved against this directory.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub url_path: String,
    pub variants: VariantConfig,
}

impl ProcessorOptions {
    pub fn from_config(config: &SiteConfig, paths: &SitePaths) -> Self {
        Self {
            input_dir: paths.input.clone(),
            output_dir: paths.image_output.clone(),
            url_path: config.images.url_path.clone(),
            variants: VariantConfig {
                widths: config.images.widths.clone(),
                quality: Quality::new(config.images.quality),
            },
        }
    }

    /// Public URL for a rendition filename.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_path.trim_end_matches('/'), filename)
    }
}

type Outcome = Result<ImageStats, ImageError>;

pub struct ImageProcessor<B: ImageBackend> {
    backend: B,
    options: ProcessorOptions,
    memo: Mutex<HashMap<String, Arc<OnceLock<Outcome>>>>,
    counters: CacheCounters,
}

impl<B: ImageBackend> ImageProcessor<B> {
    pub fn new(backend: B, options: ProcessorOptions) -> Self {
        Self {
            backend,
            options,
            memo: Mutex::new(HashMap::new()),
            counters: CacheCounters::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Encoded vs. reused renditions so far.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Process a cleaned (no leading slash) asset path.
    pub fn process(&self, clean_path: &str) -> Outcome {
        let cell = {
            let mut memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(memo.entry(clean_path.to_string()).or_default())
        };
        cell.get_or_init(|| {
            let outcome = self.process_uncached(clean_path);
            if outcome.is_err() {
                self.counters.failure();
            }
            outcome
        })
        .clone()
    }

    fn process_uncached(&self, clean_path: &str) -> Outcome {
        let source = self.options.input_dir.join(clean_path);
        if !source.is_file() {
            return Err(ImageError::SourceNotFound(source));
        }

        let dims =
            get_dimensions(&self.backend, &source).map_err(|e| ImageError::processing(&source, e))?;
        let source_hash =
            cache::hash_file(&source).map_err(|e| ImageError::processing(&source, e))?;
        let params_hash = cache::hash_webp_params(self.options.variants.quality.value());
        let content_id = cache::content_id(&source_hash, &params_hash);

        let generated = create_webp_variants(
            &self.backend,
            &source,
            &self.options.output_dir,
            &content_id,
            dims,
            &self.options.variants,
        )
        .map_err(|e| ImageError::processing(&source, e))?;

        let webp = generated
            .into_iter()
            .map(|g| {
                if g.encoded {
                    self.counters.miss();
                } else {
                    self.counters.hit();
                }
                let size = std::fs::metadata(&g.output_path)
                    .map(|m| m.len())
                    .unwrap_or(0);
                Variant {
                    format: "webp".to_string(),
                    width: g.width,
                    height: g.height,
                    url: self.options.url_for(&g.filename),
                    filename: g.filename,
                    output_path: g.output_path,
                    size,
                    source_type: "image/webp".to_string(),
                }
            })
            .collect();

        Ok(ImageStats { webp })
    }
}
