//! Passthrough copy: static files copied verbatim into the output tree.
//!
//! Each configured path is resolved against the input directory and copied
//! to the same relative location under the output directory:
//!
//! ```text
//! css/style.css        →  _site/css/style.css
//! images/cat.jpg       →  _site/images/cat.jpg
//! fonts/               →  _site/fonts/        (recursively)
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PassthroughError {
    #[error("IO error copying {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Files copied for one configured path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedPath {
    pub path: String,
    pub files: usize,
}

/// Copy every configured path from `input_dir` into `output_dir`.
///
/// Missing paths are skipped. Returns one entry per path that existed.
pub fn copy_all(
    input_dir: &Path,
    output_dir: &Path,
    paths: &[String],
) -> Result<Vec<CopiedPath>, PassthroughError> {
    let mut copied = Vec::new();
    for rel in paths {
        let src = input_dir.join(rel);
        if !src.exists() {
            debug!(path = %rel, "Passthrough path does not exist, skipping");
            continue;
        }
        let files = copy_path(&src, &output_dir.join(rel))?;
        copied.push(CopiedPath {
            path: rel.clone(),
            files,
        });
    }
    Ok(copied)
}

/// Copy a file, or a directory recursively. Returns the number of files copied.
fn copy_path(src: &Path, dst: &Path) -> Result<usize, PassthroughError> {
    if src.is_file() {
        copy_file(src, dst)?;
        return Ok(1);
    }

    let mut count = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|source| PassthroughError::Io {
                path: target.clone(),
                source,
            })?;
        } else {
            copy_file(entry.path(), &target)?;
            count += 1;
        }
    }
    Ok(count)
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), PassthroughError> {
    let io_err = |source| PassthroughError::Io {
        path: src.to_path_buf(),
        source,
    };
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::copy(src, dst).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn copies_directories_recursively() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("src");
        let output = tmp.path().join("_site");
        std::fs::create_dir_all(input.join("css")).unwrap();
        std::fs::create_dir_all(input.join("fonts/inter")).unwrap();
        std::fs::write(input.join("css/style.css"), "body{}").unwrap();
        std::fs::write(input.join("fonts/inter/inter.woff2"), "font").unwrap();

        let copied = copy_all(&input, &output, &paths(&["css", "fonts"])).unwrap();

        assert_eq!(
            copied,
            vec![
                CopiedPath {
                    path: "css".into(),
                    files: 1
                },
                CopiedPath {
                    path: "fonts".into(),
                    files: 1
                },
            ]
        );
        assert_eq!(
            std::fs::read_to_string(output.join("css/style.css")).unwrap(),
            "body{}"
        );
        assert!(output.join("fonts/inter/inter.woff2").exists());
    }

    #[test]
    fn copies_single_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("robots.txt"), "User-agent: *").unwrap();
        let output = tmp.path().join("out");

        copy_all(tmp.path(), &output, &paths(&["robots.txt"])).unwrap();
        assert!(output.join("robots.txt").exists());
    }

    #[test]
    fn missing_paths_skipped() {
        let tmp = TempDir::new().unwrap();
        let copied = copy_all(tmp.path(), &tmp.path().join("out"), &paths(&["js"])).unwrap();
        assert!(copied.is_empty());
        assert!(!tmp.path().join("out/js").exists());
    }

    #[test]
    fn empty_directory_is_created() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("images")).unwrap();
        let output = tmp.path().join("out");

        let copied = copy_all(tmp.path(), &output, &paths(&["images"])).unwrap();
        assert_eq!(copied[0].files, 0);
        assert!(output.join("images").is_dir());
    }
}
