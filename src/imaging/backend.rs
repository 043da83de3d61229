//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers every pixel operation the glint
//! pipeline needs from an image library: identify, load, upscale, blur, and
//! masked composite. Planning code (crop origins, blit lists, color-to-alpha
//! mapping) lives outside the backend and never touches a decoder.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::{Blit, Size};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Every backend must implement all five operations so the glint,
/// compositor, and pipeline code stays backend-agnostic.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Size, BackendError>;

    /// Decode an image from disk, converted to RGBA.
    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Upscale by an integer factor with nearest-neighbour sampling.
    fn upscale(&self, image: &RgbaImage, factor: u32) -> RgbaImage;

    /// Gaussian blur with the given standard deviation in pixels.
    fn blur(&self, image: &RgbaImage, sigma: f32) -> RgbaImage;

    /// Paste `blit.src` of `layer` onto `canvas` at `blit.dest`.
    ///
    /// The per-pixel mask is `min(layer alpha, canvas alpha)`, so the layer
    /// never shows where the canvas was transparent.
    fn composite(&self, canvas: &mut RgbaImage, layer: &RgbaImage, blit: &Blit);
}
