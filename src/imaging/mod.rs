//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Load** | `image::ImageReader` → RGBA8 |
//! | **Upscale** | `imageops::resize` (nearest) |
//! | **Blur** | `imageops::blur` |
//! | **Masked composite** | custom row-parallel blend |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for scroll offsets and blit planning (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{DRIFT, crop_origin, plan_blits, scaled_size, scroll_offset};
pub use params::{Blit, Offset, Quality, Rect, Size};
pub use rust_backend::{RustBackend, supported_input_extensions};
