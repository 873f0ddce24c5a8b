//! Page discovery and rendering with [Tera](https://keats.github.io/tera/).
//!
//! The image helper is exposed to templates twice:
//!
//! ```text
//! {{ "images/cat.jpg" | image }}                                  → URL
//! {{ image(path="images/cat.jpg", alt="A cat", class="hero") }}   → <img> tag
//! ```
//!
//! Both are registered as safe, so Tera's HTML auto-escaping leaves their
//! output alone; the tag's attribute values are escaped when the tag is built.
//!
//! ## Pages and permalinks
//!
//! Every file under the input directory whose extension is a configured
//! template format is a page, except entries starting with `.` or `_`,
//! configured ignores, and explicitly excluded paths (output directory,
//! passthrough paths). Markdown pages are rendered as templates first, then
//! converted with `pulldown-cmark`.
//!
//! ```text
//! index.html       →  index.html
//! about.md         →  about/index.html
//! blog/post.html   →  blog/post/index.html
//! blog/index.md    →  blog/index.html
//! ```
//!
//! Files under the includes directory are registered by their path relative
//! to it, so pages can `{% include "header.html" %}` or
//! `{% extends "base.html" %}`. Data files (`*.json`, `*.toml`) in the data
//! directory become global variables named after the file stem.

use crate::helper::{ImageHelper, TagOptions};
use crate::imaging::ImageBackend;
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context, Tera, Value};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("template error in {name}: {message}")]
    Render { name: String, message: String },
    #[error("data file {path}: {message}")]
    Data { path: PathBuf, message: String },
}

impl TemplateError {
    fn render(name: &str, err: &tera::Error) -> Self {
        Self::Render {
            name: name.to_string(),
            message: collect_error_chain(err).join(": "),
        }
    }
}

/// Tera's top-level messages are vague ("Failed to render 'x'"); the cause
/// is further down the chain.
fn collect_error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }
    chain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Html,
    Markdown,
}

impl PageKind {
    fn from_extension(ext: &str) -> Self {
        match ext {
            "md" | "markdown" => PageKind::Markdown,
            _ => PageKind::Html,
        }
    }
}

/// A template that becomes one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Path relative to the input directory, `/`-separated. Also the
    /// template name.
    pub input_path: String,
    pub source: PathBuf,
    pub kind: PageKind,
    /// Output path relative to the output directory.
    pub output_path: PathBuf,
}

impl Page {
    /// Root-relative URL the page is served at.
    pub fn url(&self) -> String {
        let path = self.output_path.to_string_lossy().replace('\\', "/");
        match path.strip_suffix("index.html") {
            Some(dir) => format!("/{}", dir),
            None => format!("/{}", path),
        }
    }
}

/// Output location for a page: `name.ext` → `name/index.html`, except
/// `index.ext` → `index.html` in the same directory.
pub fn permalink(input_path: &Path) -> PathBuf {
    let parent = input_path.parent().unwrap_or(Path::new(""));
    match input_path.file_stem().and_then(|s| s.to_str()) {
        Some("index") | None => parent.join("index.html"),
        Some(stem) => parent.join(stem).join("index.html"),
    }
}

/// Settings for [`discover_pages`].
#[derive(Debug, Clone)]
pub struct Discovery<'a> {
    pub formats: &'a [String],
    pub ignore: &'a [String],
    /// Whole subtrees skipped (output dir, passthrough paths, includes).
    pub excluded: &'a [PathBuf],
}

fn is_hidden_or_private(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Find every page under `input_dir`, sorted by input path.
pub fn discover_pages(input_dir: &Path, opts: &Discovery<'_>) -> Result<Vec<Page>, TemplateError> {
    let mut pages = Vec::new();
    let walker = WalkDir::new(input_dir).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !is_hidden_or_private(&name)
            && !opts.ignore.iter().any(|i| *i == name)
            && !opts.excluded.iter().any(|ex| ex == entry.path())
    });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !opts.formats.iter().any(|f| f == ext) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(input_dir) else {
            continue;
        };

        pages.push(Page {
            input_path: rel.to_string_lossy().replace('\\', "/"),
            source: entry.path().to_path_buf(),
            kind: PageKind::from_extension(ext),
            output_path: permalink(rel),
        });
    }

    pages.sort_by(|a, b| a.input_path.cmp(&b.input_path));
    Ok(pages)
}

/// Load `*.json` and `*.toml` files from `data_dir` into a template context.
pub fn load_data(data_dir: &Path) -> Result<Context, TemplateError> {
    let mut context = Context::new();
    if !data_dir.is_dir() {
        return Ok(context);
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("json") | Some("toml") => fs::read_to_string(&path)?,
            _ => continue,
        };
        let value: Value = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| TemplateError::Data {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| TemplateError::Data {
                path: path.clone(),
                message: e.to_string(),
            })?
        };
        context.insert(stem, &value);
    }
    Ok(context)
}

/// Collect includable templates: `(name relative to includes_dir, content)`.
fn load_includes(includes_dir: &Path) -> Result<Vec<(String, String)>, TemplateError> {
    let mut templates = Vec::new();
    if !includes_dir.is_dir() {
        return Ok(templates);
    }
    for entry in WalkDir::new(includes_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(includes_dir) else {
            continue;
        };
        let name = rel.to_string_lossy().replace('\\', "/");
        templates.push((name, fs::read_to_string(entry.path())?));
    }
    Ok(templates)
}

/// The `image` filter: asset path → optimized URL.
pub struct ImageFilter<B: ImageBackend>(pub Arc<ImageHelper<B>>);

impl<B: ImageBackend + 'static> tera::Filter for ImageFilter<B> {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let path = value.as_str().unwrap_or("");
        Ok(Value::String(self.0.url(path)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// The `image` function: asset path + alt + class → `<img>` tag.
pub struct ImageShortcode<B: ImageBackend>(pub Arc<ImageHelper<B>>);

impl<B: ImageBackend + 'static> tera::Function for ImageShortcode<B> {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let opts = TagOptions {
            alt: str_arg(args, "alt").to_string(),
            class: str_arg(args, "class").to_string(),
            sizes: args.get("sizes").and_then(Value::as_str).map(str::to_string),
        };
        Ok(Value::String(self.0.tag(str_arg(args, "path"), &opts)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// A string argument, or `""` when absent or not a string.
fn str_arg<'a>(args: &'a HashMap<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or("")
}

/// Register the `image` filter and the `image` function on `tera`.
pub fn register_image_helpers<B: ImageBackend + 'static>(
    tera: &mut Tera,
    helper: Arc<ImageHelper<B>>,
) {
    tera.register_filter("image", ImageFilter(Arc::clone(&helper)));
    tera.register_function("image", ImageShortcode(helper));
}

/// Renders pages. Holds every include and page template, so rendering only
/// needs `&self` and can run from many threads at once.
pub struct PageRenderer {
    tera: Tera,
    globals: Context,
}

impl PageRenderer {
    pub fn new<B: ImageBackend + 'static>(
        pages: &[Page],
        includes_dir: &Path,
        globals: Context,
        helper: Arc<ImageHelper<B>>,
    ) -> Result<Self, TemplateError> {
        let mut templates = load_includes(includes_dir)?;
        for page in pages {
            templates.push((page.input_path.clone(), fs::read_to_string(&page.source)?));
        }

        let mut tera = Tera::default();
        register_image_helpers(&mut tera, helper);
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::render("templates", &e))?;

        Ok(Self { tera, globals })
    }

    /// Render one page to its final HTML.
    pub fn render(&self, page: &Page) -> Result<String, TemplateError> {
        let mut context = self.globals.clone();
        context.insert(
            "page",
            &serde_json::json!({
                "url": page.url(),
                "input_path": page.input_path,
                "kind": page.kind,
            }),
        );

        let rendered = self
            .tera
            .render(&page.input_path, &context)
            .map_err(|e| TemplateError::render(&page.input_path, &e))?;

        Ok(match page.kind {
            PageKind::Html => rendered,
            PageKind::Markdown => markdown_to_html(&rendered),
        })
    }
}

pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    body_html
}
