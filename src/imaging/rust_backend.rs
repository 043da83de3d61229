//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, WebP, BMP, TGA, TIFF) | `image::ImageReader` |
//! | Identify | `image::image_dimensions` |
//! | Upscale | `image::imageops::resize` with `Nearest` filter |
//! | Blur | `image::imageops::blur` (Gaussian) |
//! | Masked composite | row-parallel blend over raw RGBA bytes (`rayon`) |

use super::backend::{BackendError, ImageBackend};
use super::params::{Blit, Size};
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbaImage};
use rayon::prelude::*;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions the source collector accepts, paired with their decoder.
const SOURCE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
    ("tga", ImageFormat::Tga),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    SOURCE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend one RGBA pixel of `src` into `dst` with an 8-bit mask.
///
/// All four channels are interpolated, alpha included.
#[inline]
fn blend_masked(dst: &mut [u8], src: &[u8], mask: u8) {
    if mask == 0 {
        return;
    }
    let m = u32::from(mask);
    let inv = 255 - m;
    for (d, s) in dst.iter_mut().zip(src) {
        *d = ((u32::from(*d) * inv + u32::from(*s) * m + 127) / 255) as u8;
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Size, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Size { width, height })
    }

    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(decoded.to_rgba8())
    }

    fn upscale(&self, image: &RgbaImage, factor: u32) -> RgbaImage {
        if factor == 1 {
            return image.clone();
        }
        image::imageops::resize(
            image,
            image.width() * factor,
            image.height() * factor,
            FilterType::Nearest,
        )
    }

    fn blur(&self, image: &RgbaImage, sigma: f32) -> RgbaImage {
        if sigma <= 0.0 {
            return image.clone();
        }
        image::imageops::blur(image, sigma)
    }

    fn composite(&self, canvas: &mut RgbaImage, layer: &RgbaImage, blit: &Blit) {
        let src = blit.src;
        if src.is_empty() {
            return;
        }
        let canvas_stride = canvas.width() as usize * 4;
        let layer_stride = layer.width() as usize * 4;
        let span = src.width as usize * 4;
        let dest_x = blit.dest.0 as usize * 4;
        let layer_raw = layer.as_raw();
        let pixels: &mut [u8] = canvas;

        pixels
            .par_chunks_exact_mut(canvas_stride)
            .skip(blit.dest.1 as usize)
            .take(src.height as usize)
            .enumerate()
            .for_each(|(row, canvas_row)| {
                let start = (src.y as usize + row) * layer_stride + src.x as usize * 4;
                let layer_row = &layer_raw[start..start + span];
                let target = &mut canvas_row[dest_x..dest_x + span];
                for (dst, s) in target.chunks_exact_mut(4).zip(layer_row.chunks_exact(4)) {
                    let mask = s[3].min(dst[3]);
                    blend_masked(dst, s, mask);
                }
            });
    }
}
