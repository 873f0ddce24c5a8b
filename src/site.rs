//! The build lifecycle.
//!
//! ```text
//! 1. Before build   minify CSS (inline, or on a background thread)
//! 2. Render         discover pages, render them in parallel with the
//!                   image helpers registered
//! 3. Join           wait for pre-build tasks (an inline task failure stops
//!                   the build before step 2)
//! 4. Passthrough    copy static paths (now including minified CSS)
//! ```
//!
//! Rendered pages and optimized images land in the output directory; the
//! returned [`BuildReport`] is what `sitekit build` prints.

use crate::cache::CacheStats;
use crate::config::{ConfigError, SiteConfig, SitePaths};
use crate::helper::ImageHelper;
use crate::imaging::{ImageBackend, RustBackend};
use crate::passthrough::{self, CopiedPath, PassthroughError};
use crate::processor::{ImageProcessor, ProcessorOptions};
use crate::tasks::{CssMinifyTask, OnceTask, PreBuildTask, Scheduler, TaskError, TaskOutcome};
use crate::templates::{self, Discovery, Page, PageRenderer, TemplateError};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Passthrough copy failed: {0}")]
    Passthrough(#[from] PassthroughError),
    #[error("Pre-build task failed: {0}")]
    Task(#[from] TaskError),
}

/// One page written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub input_path: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub pages: Vec<RenderedPage>,
    pub copied: Vec<CopiedPath>,
    pub tasks: Vec<(String, TaskOutcome)>,
    pub images: CacheStats,
}

/// Build the site rooted at `root` with the production image backend.
pub fn build(root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    build_with_backend(RustBackend::new(), root, config)
}

/// Build using a specific image backend (allows testing with a mock).
pub fn build_with_backend<B: ImageBackend + 'static>(
    backend: B,
    root: &Path,
    config: &SiteConfig,
) -> Result<BuildReport, BuildError> {
    let paths = SitePaths::resolve(root, config);
    fs::create_dir_all(&paths.output)?;

    let css: Arc<dyn PreBuildTask> = Arc::new(OnceTask::new(css_task(config, &paths)));
    let pending = Scheduler::from_background_flag(config.css.background).spawn(css);
    // An inline task has already finished; fail before any page is written.
    if let Some(Err(e)) = pending.finished() {
        return Err(e.clone().into());
    }

    let helper = Arc::new(image_helper(backend, config, &paths));
    let rendered = render_pages(config, &paths, Arc::clone(&helper));

    let task_name = pending.name().to_string();
    let task_outcome = pending.join()?;
    debug!(task = %task_name, outcome = ?task_outcome, "Pre-build task finished");
    let pages = rendered?;

    let copied = passthrough::copy_all(&paths.input, &paths.output, &config.passthrough.paths)?;

    let images = helper.processor().stats();
    info!(pages = pages.len(), images = %images, "Build complete");

    Ok(BuildReport {
        output_dir: paths.output,
        pages,
        copied,
        tasks: vec![(task_name, task_outcome)],
        images,
    })
}

/// Construct the image helper the templates use.
pub fn image_helper<B: ImageBackend>(
    backend: B,
    config: &SiteConfig,
    paths: &SitePaths,
) -> ImageHelper<B> {
    ImageHelper::new(ImageProcessor::new(
        backend,
        ProcessorOptions::from_config(config, paths),
    ))
}

fn css_task(config: &SiteConfig, paths: &SitePaths) -> CssMinifyTask {
    CssMinifyTask {
        source: paths.input.join(&config.css.source),
        output: paths.input.join(&config.css.output),
        command: config.css.command.clone(),
    }
}

/// Subtrees that never contain pages.
fn excluded_paths(config: &SiteConfig, paths: &SitePaths) -> Vec<PathBuf> {
    let mut excluded = vec![
        paths.output.clone(),
        paths.image_output.clone(),
        paths.includes.clone(),
        paths.data.clone(),
    ];
    excluded.extend(config.passthrough.paths.iter().map(|p| paths.input.join(p)));
    excluded
}

fn render_pages<B: ImageBackend + 'static>(
    config: &SiteConfig,
    paths: &SitePaths,
    helper: Arc<ImageHelper<B>>,
) -> Result<Vec<RenderedPage>, BuildError> {
    let excluded = excluded_paths(config, paths);
    let pages = templates::discover_pages(
        &paths.input,
        &Discovery {
            formats: &config.templates.formats,
            ignore: &config.templates.ignore,
            excluded: &excluded,
        },
    )?;
    let globals = templates::load_data(&paths.data)?;
    let renderer = PageRenderer::new(&pages, &paths.includes, globals, helper)?;

    pages
        .par_iter()
        .map(|page| write_page(&renderer, page, &paths.output))
        .collect()
}

fn write_page(
    renderer: &PageRenderer,
    page: &Page,
    output_dir: &Path,
) -> Result<RenderedPage, BuildError> {
    let html = renderer.render(page)?;
    let target = output_dir.join(&page.output_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, html)?;
    debug!(page = %page.input_path, output = %target.display(), "Wrote page");
    Ok(RenderedPage {
        input_path: page.input_path.clone(),
        output_path: page.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::setup_site;

    fn config_without_css() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.css.source = "css/none.css".to_string();
        config
    }

    #[test]
    fn builds_pages_and_copies_static_paths() {
        let site = setup_site(&[
            ("index.html", r#"{{ image(path="images/cat.jpg", alt="Cat") }}"#),
            ("about.md", "# About"),
            ("images/cat.jpg", "jpeg"),
            ("js/app.js", "console.log(1)"),
        ]);
        let root = site.path();

        let report =
            build_with_backend(MockBackend::with_dimensions(50, 40), root, &config_without_css())
                .unwrap();

        assert_eq!(report.pages.len(), 2);
        let index = fs::read_to_string(root.join("_site/index.html")).unwrap();
        assert!(index.contains(r#"src="/img/"#));
        assert!(index.contains(r#"alt="Cat""#));
        assert_eq!(
            fs::read_to_string(root.join("_site/about/index.html")).unwrap(),
            "<h1>About</h1>\n"
        );
        assert!(root.join("_site/images/cat.jpg").exists());
        assert!(root.join("_site/js/app.js").exists());
        assert_eq!(report.images.misses, 1);
        assert_eq!(
            report.tasks,
            vec![("minify-css".to_string(), TaskOutcome::NoSource)]
        );
    }

    #[test]
    fn missing_image_degrades_without_failing_build() {
        let site = setup_site(&[("index.html", r#"{{ "gone.png" | image }}"#)]);

        let report =
            build_with_backend(MockBackend::new(), site.path(), &config_without_css()).unwrap();

        assert_eq!(
            fs::read_to_string(site.path().join("_site/index.html")).unwrap(),
            "/gone.png"
        );
        assert_eq!(report.images.failures, 1);
    }

    #[test]
    fn templates_in_passthrough_dirs_not_rendered() {
        let site = setup_site(&[("css/demo.html", "{{ not_rendered }}")]);

        let report =
            build_with_backend(MockBackend::new(), site.path(), &config_without_css()).unwrap();

        assert!(report.pages.is_empty());
        assert_eq!(
            fs::read_to_string(site.path().join("_site/css/demo.html")).unwrap(),
            "{{ not_rendered }}"
        );
    }

    #[test]
    fn template_error_fails_build() {
        let site = setup_site(&[("index.html", "{{ undefined_thing }}")]);

        let result = build_with_backend(MockBackend::new(), site.path(), &config_without_css());
        assert!(matches!(result, Err(BuildError::Template(_))));
    }

    #[cfg(unix)]
    #[test]
    fn css_minified_before_passthrough_copy() {
        let site = setup_site(&[("css/style.css", "body { margin: 0 }")]);
        let root = site.path();
        let mut config = SiteConfig::default();
        config.css.command = vec!["cp".into(), "{input}".into(), "{output}".into()];
        config.css.background = true;

        let report = build_with_backend(MockBackend::new(), root, &config).unwrap();

        assert_eq!(report.tasks[0].1, TaskOutcome::Ran);
        assert!(root.join("css/style.min.css").exists());
        assert!(root.join("_site/css/style.min.css").exists());
    }

    #[test]
    fn failing_minifier_fails_build() {
        let site = setup_site(&[("css/style.css", "body {}"), ("index.html", "home")]);
        let mut config = SiteConfig::default();
        config.css.command = vec!["no-such-minifier-binary".into(), "{input}".into()];

        let result = build_with_backend(MockBackend::new(), site.path(), &config);
        assert!(matches!(
            result,
            Err(BuildError::Task(TaskError::Spawn { .. }))
        ));
        assert!(!site.path().join("_site/index.html").exists());
    }
}
