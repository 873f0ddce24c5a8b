//! CLI output formatting.
//!
//! Output is information-first: each rendered page leads with its source
//! template, followed by `→` and the file it produced. Pre-build tasks,
//! passthrough copies and image cache stats follow as short sections.
//!
//! ```text
//! Pages
//!     index.html → index.html
//!     about.md → about/index.html
//!
//! Tasks
//!     minify-css: ran
//!
//! Passthrough
//!     css (2 files)
//!     images (14 files)
//!
//! Images: 3 cached, 1 encoded (4 total)
//! Built 2 pages → _site
//! ```
//!
//! Each `format_*` function returns `Vec<String>` for testability; the build
//! summary has a `print_*` wrapper that writes to stdout. Format functions are
//! pure: no I/O, no side effects.

use crate::processor::ImageStats;
use crate::site::BuildReport;
use crate::tasks::TaskOutcome;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

fn outcome_label(outcome: &TaskOutcome) -> &'static str {
    match outcome {
        TaskOutcome::Ran => "ran",
        TaskOutcome::Fresh => "up to date",
        TaskOutcome::NoSource => "skipped (no source)",
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    if report.pages.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for page in &report.pages {
        lines.push(format!(
            "{}{} \u{2192} {}",
            indent(1),
            page.input_path,
            page.output_path.display()
        ));
    }

    if !report.tasks.is_empty() {
        lines.push(String::new());
        lines.push("Tasks".to_string());
        for (name, outcome) in &report.tasks {
            lines.push(format!("{}{}: {}", indent(1), name, outcome_label(outcome)));
        }
    }

    if !report.copied.is_empty() {
        lines.push(String::new());
        lines.push("Passthrough".to_string());
        for copied in &report.copied {
            lines.push(format!(
                "{}{} ({})",
                indent(1),
                copied.path,
                plural(copied.files, "file", "files")
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("Images: {}", report.images));
    lines.push(format!(
        "Built {} \u{2192} {}",
        plural(report.pages.len(), "page", "pages"),
        report.output_dir.display()
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Single image
// ============================================================================

/// Format the renditions produced for one image.
///
/// ```text
/// images/cat.jpg
///     640x480 → /img/3f9a1c02be-640.webp (41.2 KB)
/// ```
pub fn format_image_output(path: &str, stats: &ImageStats) -> Vec<String> {
    let mut lines = vec![path.to_string()];
    for variant in &stats.webp {
        lines.push(format!(
            "{}{}x{} \u{2192} {} ({})",
            indent(1),
            variant.width,
            variant.height,
            variant.url,
            format_size(variant.size)
        ));
    }
    lines
}
