//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{PlannedSize, plan_sizes};
use super::params::{Quality, ResizeParams};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Length of the content id prefix in generated filenames.
const ID_LEN: usize = 10;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for WebP rendition generation.
#[derive(Debug, Clone, Default)]
pub struct VariantConfig {
    /// Requested widths; empty = original width only.
    pub widths: Vec<u32>,
    pub quality: Quality,
}

/// One rendition on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub filename: String,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// `false` when an identical rendition was already on disk.
    pub encoded: bool,
}

/// Filename for one rendition: `{content_id}-{width}.webp`.
///
/// `content_id` is derived from the source bytes and encoding parameters, so
/// the same image under a different path maps to the same file.
pub fn variant_filename(content_id: &str, width: u32) -> String {
    let id_len = content_id.len().min(ID_LEN);
    format!("{}-{}.webp", &content_id[..id_len], width)
}

/// Plan the resize operations for a source without executing them.
pub fn plan_variants(
    source: &Path,
    output_dir: &Path,
    content_id: &str,
    original_dims: (u32, u32),
    config: &VariantConfig,
) -> Vec<ResizeParams> {
    plan_sizes(original_dims, &config.widths)
        .into_iter()
        .map(|PlannedSize { width, height }| ResizeParams {
            source: source.to_path_buf(),
            output: output_dir.join(variant_filename(content_id, width)),
            width,
            height,
            quality: config.quality,
        })
        .collect()
}

/// Create WebP renditions at every planned width.
///
/// Renditions whose file already exists are reused without re-encoding.
/// Returned variants are ordered by ascending width.
pub fn create_webp_variants(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    content_id: &str,
    original_dims: (u32, u32),
    config: &VariantConfig,
) -> Result<Vec<GeneratedVariant>> {
    std::fs::create_dir_all(output_dir)?;

    let mut variants = Vec::new();
    for params in plan_variants(source, output_dir, content_id, original_dims, config) {
        let encoded = if params.output.exists() {
            false
        } else {
            backend.resize(&params)?;
            true
        };

        let filename = params
            .output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        variants.push(GeneratedVariant {
            filename,
            output_path: params.output,
            width: params.width,
            height: params.height,
            encoded,
        });
    }

    Ok(variants)
}
