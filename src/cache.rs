//! Content addressing for optimized images.
//!
//! WebP encoding is the expensive part of a build, so renditions are named by
//! what they contain rather than where they came from. A rendition's filename
//! starts with a content id:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Content-based
//!   rather than mtime-based so it survives `git checkout` (which resets
//!   modification times).
//! - **`params_hash`**: SHA-256 of the encoding parameters (format, quality).
//!   Width is part of the filename itself.
//!
//! The content id is the SHA-256 of both. If a file with that name already
//! exists in the image output directory, the rendition is reused as-is; any
//! change to the source bytes or quality produces a new name. Stale files are
//! never deleted, they just stop being referenced.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 hash of the encoding parameters for a WebP rendition.
pub fn hash_webp_params(quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"webp\0");
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Combine source and params hashes into the id used in filenames.
pub fn content_id(source_hash: &str, params_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_hash.as_bytes());
    hasher.update(b":");
    hasher.update(params_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of image processing for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failures: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )?;
        } else {
            write!(f, "{} encoded", self.misses)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        Ok(())
    }
}

/// Thread-safe counters behind [`CacheStats`], shared by render workers.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU32,
    misses: AtomicU32,
    failures: AtomicU32,
}

impl CacheCounters {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hash_file_deterministic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");
        fs::write(&path, b"hello world").unwrap();

        let h1 = hash_file(&path).unwrap();
        let h2 = hash_file(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_file_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");

        fs::write(&path, b"version 1").unwrap();
        let h1 = hash_file(&path).unwrap();
        fs::write(&path, b"version 2").unwrap();
        let h2 = hash_file(&path).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_file_missing_is_error() {
        assert!(hash_file(Path::new("/nonexistent/file.jpg")).is_err());
    }

    #[test]
    fn webp_params_vary_with_quality() {
        assert_eq!(hash_webp_params(80), hash_webp_params(80));
        assert_ne!(hash_webp_params(80), hash_webp_params(90));
    }

    #[test]
    fn content_id_depends_on_both_inputs() {
        let a = content_id("src", &hash_webp_params(80));
        assert_ne!(a, content_id("src2", &hash_webp_params(80)));
        assert_ne!(a, content_id("src", &hash_webp_params(70)));
    }

    #[test]
    fn cache_stats_display_with_hits() {
        let s = CacheStats {
            hits: 5,
            misses: 2,
            failures: 0,
        };
        assert_eq!(format!("{}", s), "5 cached, 2 encoded (7 total)");
    }

    #[test]
    fn cache_stats_display_no_hits_with_failures() {
        let s = CacheStats {
            hits: 0,
            misses: 3,
            failures: 1,
        };
        assert_eq!(format!("{}", s), "3 encoded, 1 failed");
    }

    #[test]
    fn counters_snapshot() {
        let c = CacheCounters::default();
        c.hit();
        c.miss();
        c.miss();
        c.failure();
        assert_eq!(
            c.snapshot(),
            CacheStats {
                hits: 1,
                misses: 2,
                failures: 1
            }
        );
    }
}
