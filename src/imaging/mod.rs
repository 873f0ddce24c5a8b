//! Image processing: decode with `image`, encode with `webp`.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize → WebP** | Lanczos3 + libwebp lossy encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{PlannedSize, plan_sizes};
pub use operations::{
    GeneratedVariant, VariantConfig, create_webp_variants, get_dimensions, variant_filename,
};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
