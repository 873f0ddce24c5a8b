//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the image helper and the
//! pixel library: identify a source, and resize + encode it to a file.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends must be `Send + Sync`: pages render in parallel and every render
/// worker shares one backend.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, scale to the requested size, encode to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `resize` writes a small placeholder file so callers that check for the
    /// output on disk see it.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Option<Dimensions>,
        pub fail_resize: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        /// A backend with no images: every identify fails.
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        pub fn failing_resize(width: u32, height: u32) -> Self {
            Self {
                fail_resize: true,
                ..Self::with_dimensions(width, height)
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn resize_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Resize { .. }))
                .count()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.dimensions
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            if self.fail_resize {
                return Err(BackendError::ProcessingFailed("mock encode failure".into()));
            }
            std::fs::write(&params.output, b"RIFF")?;
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(800, 600);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_without_dimensions_fails_identify() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("missing.jpg")).is_err());
    }

    #[test]
    fn mock_records_resize() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: tmp.path().join("out.webp"),
                width: 800,
                height: 600,
                quality: super::super::params::Quality::new(80),
            })
            .unwrap();

        assert!(tmp.path().join("out.webp").exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize {
                width: 800,
                height: 600,
                quality: 80,
                ..
            }
        ));
    }
}
