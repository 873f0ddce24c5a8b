//! The image helper: a URL-producing filter and a tag-producing shortcode.
//!
//! Both entry points normalize the asset path, ask the [`ImageProcessor`] for
//! a WebP rendition and format the result. They never fail: a processing
//! error is logged with the offending path and replaced by a fallback that
//! points at the original, unoptimized file, so one bad image reference
//! cannot abort a page render.
//!
//! ```text
//! "images/cat.jpg"  ──▶  "/img/3f9a1c02be-640.webp"     (processed)
//!                   ──▶  "/images/cat.jpg"              (fallback)
//! ```

use crate::html::{self, ImageAttributes};
use crate::imaging::ImageBackend;
use crate::processor::{ImageError, ImageProcessor};
use tracing::error;

/// Optional arguments of the tag shortcode. All default to empty/absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions {
    /// `alt` text; empty renders `alt=""`.
    pub alt: String,
    /// `class` attribute; omitted entirely when empty.
    pub class: String,
    /// `sizes` for multi-width output; defaults to `100vw`.
    pub sizes: Option<String>,
}

impl TagOptions {
    pub fn new(alt: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            alt: alt.into(),
            class: class.into(),
            sizes: None,
        }
    }

    fn class(&self) -> Option<&str> {
        (!self.class.is_empty()).then_some(self.class.as_str())
    }
}

/// Strip a single leading `/` so the path resolves against the input dir.
pub fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// The original path as a root-relative URL.
pub fn fallback_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub struct ImageHelper<B: ImageBackend> {
    processor: ImageProcessor<B>,
}

impl<B: ImageBackend> ImageHelper<B> {
    pub fn new(processor: ImageProcessor<B>) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &ImageProcessor<B> {
        &self.processor
    }

    /// Resolve an asset path to the URL of its optimized rendition.
    ///
    /// Empty input yields an empty string without touching the processor.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }

        match self.processor.process(strip_leading_slash(path)) {
            Ok(stats) => match stats.primary() {
                Some(variant) => variant.url.clone(),
                None => self.fail(path, &no_renditions(path)),
            },
            Err(e) => self.fail(path, &e),
        }
    }

    /// Resolve an asset path to a complete `<img>` tag.
    ///
    /// Empty input yields an empty string without touching the processor.
    pub fn tag(&self, path: &str, opts: &TagOptions) -> String {
        if path.is_empty() {
            return String::new();
        }

        let rendered = self
            .processor
            .process(strip_leading_slash(path))
            .and_then(|stats| {
                let attrs = ImageAttributes::lazy(&opts.alt)
                    .with_class(&opts.class)
                    .with_sizes(opts.sizes.as_deref());
                html::generate_html(&stats, &attrs).ok_or_else(|| no_renditions(path))
            });

        match rendered {
            Ok(markup) => markup.into_string(),
            Err(e) => {
                let src = self.fail(path, &e);
                html::fallback_html(&src, &opts.alt, opts.class()).into_string()
            }
        }
    }

    fn fail(&self, path: &str, err: &ImageError) -> String {
        error!(path, error = %err, "Error optimizing image");
        fallback_path(path)
    }
}

fn no_renditions(path: &str) -> ImageError {
    ImageError::Processing {
        path: path.into(),
        message: "no renditions produced".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::VariantConfig;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::processor::ProcessorOptions;
    use tempfile::TempDir;

    /// Helper whose processor is "unavailable": no source files exist.
    fn unavailable(tmp: &TempDir) -> ImageHelper<MockBackend> {
        helper_with(tmp, MockBackend::with_dimensions(10, 10))
    }

    fn helper_with(tmp: &TempDir, backend: MockBackend) -> ImageHelper<MockBackend> {
        let options = ProcessorOptions {
            input_dir: tmp.path().to_path_buf(),
            output_dir: tmp.path().join("_site/img"),
            url_path: "/img/".to_string(),
            variants: VariantConfig::default(),
        };
        ImageHelper::new(ImageProcessor::new(backend, options))
    }

    fn with_source(tmp: &TempDir, rel: &str, width: u32, height: u32) -> ImageHelper<MockBackend> {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jpeg").unwrap();
        helper_with(tmp, MockBackend::with_dimensions(width, height))
    }

    #[test]
    fn strip_leading_slash_removes_only_one() {
        assert_eq!(strip_leading_slash("/images/a.jpg"), "images/a.jpg");
        assert_eq!(strip_leading_slash("images/a.jpg"), "images/a.jpg");
        assert_eq!(strip_leading_slash("//images/a.jpg"), "/images/a.jpg");
    }

    #[test]
    fn fallback_path_prefixes_slash_once() {
        assert_eq!(fallback_path("images/cat.jpg"), "/images/cat.jpg");
        assert_eq!(fallback_path("/images/cat.jpg"), "/images/cat.jpg");
    }

    #[test]
    fn empty_path_returns_empty_without_processing() {
        let tmp = TempDir::new().unwrap();
        let helper = unavailable(&tmp);

        assert_eq!(helper.url(""), "");
        assert_eq!(helper.tag("", &TagOptions::new("alt", "hero")), "");
        assert!(helper.processor().backend().get_operations().is_empty());
    }

    #[test]
    fn url_fallback_for_relative_path() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(unavailable(&tmp).url("images/cat.jpg"), "/images/cat.jpg");
    }

    #[test]
    fn url_fallback_keeps_leading_slash_path() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(unavailable(&tmp).url("/images/cat.jpg"), "/images/cat.jpg");
    }

    #[test]
    fn tag_fallback_without_alt_or_class() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            unavailable(&tmp).tag("images/cat.jpg", &TagOptions::default()),
            r#"<img src="/images/cat.jpg" alt="">"#
        );
    }

    #[test]
    fn tag_fallback_with_class() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            unavailable(&tmp).tag("/images/cat.jpg", &TagOptions::new("", "hero")),
            r#"<img src="/images/cat.jpg" alt="" class="hero">"#
        );
    }

    #[test]
    fn tag_fallback_on_encode_failure_keeps_alt() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("cat.jpg"), b"jpeg").unwrap();
        let helper = helper_with(&tmp, MockBackend::failing_resize(10, 10));

        assert_eq!(
            helper.tag("cat.jpg", &TagOptions::new("A cat", "")),
            r#"<img src="/cat.jpg" alt="A cat">"#
        );
    }

    #[test]
    fn url_success_returns_variant_url() {
        let tmp = TempDir::new().unwrap();
        let helper = with_source(&tmp, "images/cat.jpg", 640, 480);

        let url = helper.url("/images/cat.jpg");
        let stats = helper.processor().process("images/cat.jpg").unwrap();
        assert_eq!(url, stats.webp[0].url);
        assert!(url.starts_with("/img/"));
    }

    #[test]
    fn relative_path_processed_unchanged() {
        let tmp = TempDir::new().unwrap();
        let helper = with_source(&tmp, "images/cat.jpg", 640, 480);
        helper.url("images/cat.jpg");

        let expected = tmp.path().join("images/cat.jpg").to_string_lossy().to_string();
        let ops = helper.processor().backend().get_operations();
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == &expected));
    }

    #[test]
    fn tag_success_has_lazy_async_and_alt() {
        let tmp = TempDir::new().unwrap();
        let helper = with_source(&tmp, "images/cat.jpg", 640, 480);

        let tag = helper.tag("images/cat.jpg", &TagOptions::new("A cat", ""));
        assert!(tag.starts_with("<img "));
        assert!(tag.contains(r#"loading="lazy""#));
        assert!(tag.contains(r#"decoding="async""#));
        assert!(tag.contains(r#"alt="A cat""#));
        assert!(tag.contains(r#"width="640""#));
        assert!(!tag.contains("class="));
    }

    #[test]
    fn tag_success_with_class() {
        let tmp = TempDir::new().unwrap();
        let helper = with_source(&tmp, "images/cat.jpg", 64, 48);

        let tag = helper.tag("images/cat.jpg", &TagOptions::new("", "hero"));
        assert!(tag.contains(r#"class="hero""#));
    }
}
