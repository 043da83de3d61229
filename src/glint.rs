//! Glint layer preparation.
//!
//! Turns the glint source texture into the translucent overlay the
//! compositor scrolls across every frame. Runs once per batch:
//!
//! ```text
//! texture.png ─▶ recolor alpha ─▶ upscale ×scale ─▶ blur ─▶ brighten RGB ─▶ halve alpha
//! ```
//!
//! ## Color-to-alpha
//!
//! The source texture is opaque: its "glow" is encoded as color, a purple
//! that fades towards a dark background. [`AlphaMapping`] converts that
//! color into coverage. The stock mapping, [`ColorDistanceAlpha`], measures
//! how far each channel sits below a reference color (scaled per channel by
//! the reference-to-background span) and turns the summed distance into
//! transparency. Its constants are calibrated against the vanilla
//! `enchanted_glint_item.png`; another texture wants its own constants,
//! which is why they live in config rather than in code.
//!
//! The result is clamped to `0..=255`. Colors brighter than the reference
//! saturate at fully opaque; colors far darker than the background
//! saturate at fully transparent.

use crate::imaging::{BackendError, ImageBackend, Size};
use image::RgbaImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlintError {
    #[error("Cannot load glint texture {path}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Glint scale must be at least 2, got {0}")]
    InvalidScale(u32),
    #[error("Glint layer must not be empty, got {0:?}")]
    EmptyLayer(Size),
}

/// Strategy that derives a pixel's alpha from its color.
pub trait AlphaMapping: Sync {
    fn alpha(&self, rgb: [u8; 3]) -> u8;
}

/// Affine color-distance model: `255 - round(weight * Σ (ref - px) / span)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDistanceAlpha {
    pub reference: [f32; 3],
    pub span: [f32; 3],
    pub weight: f32,
}

impl ColorDistanceAlpha {
    /// Calibration for the vanilla enchantment glint texture.
    pub fn enchantment() -> Self {
        Self {
            reference: [112.0, 68.0, 159.0],
            span: [138.0, 76.0, 207.0],
            weight: 85.0,
        }
    }
}

impl Default for ColorDistanceAlpha {
    fn default() -> Self {
        Self::enchantment()
    }
}

impl AlphaMapping for ColorDistanceAlpha {
    fn alpha(&self, rgb: [u8; 3]) -> u8 {
        let distance: f32 = (0..3)
            .map(|c| (self.reference[c] - f32::from(rgb[c])) / self.span[c])
            .sum();
        (255.0 - (self.weight * distance).round()).clamp(0.0, 255.0) as u8
    }
}

/// Tunables for [`prepare_glint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlintParams {
    /// Integer upscale factor; also sets the tiling period. At least 2.
    pub scale: u32,
    /// Gaussian blur standard deviation, in pixels of the upscaled layer.
    pub blur_sigma: f32,
    /// RGB multiplier applied after blurring.
    pub brightness: f32,
}

impl Default for GlintParams {
    fn default() -> Self {
        Self {
            scale: 4,
            blur_sigma: 3.0,
            brightness: 1.2,
        }
    }
}

/// The prepared overlay. Read-only once built; its size is the tiling period.
#[derive(Debug, Clone)]
pub struct GlintLayer {
    image: RgbaImage,
}

impl GlintLayer {
    /// Wrap an already-prepared overlay. The tiling period is the image
    /// size, so both dimensions must be non-zero.
    pub fn from_image(image: RgbaImage) -> Result<Self, GlintError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GlintError::EmptyLayer(Size::of(&image)));
        }
        Ok(Self { image })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn size(&self) -> Size {
        Size::of(&self.image)
    }
}

/// Build the glint layer from a texture on disk.
pub fn prepare_glint(
    backend: &impl ImageBackend,
    texture: &Path,
    params: &GlintParams,
    mapping: &impl AlphaMapping,
) -> Result<GlintLayer, GlintError> {
    if params.scale < 2 {
        return Err(GlintError::InvalidScale(params.scale));
    }

    let mut source = backend.load(texture).map_err(|source| GlintError::Asset {
        path: texture.to_path_buf(),
        source,
    })?;

    recolor_alpha(&mut source, mapping);
    let scaled = backend.upscale(&source, params.scale);
    let mut layer = backend.blur(&scaled, params.blur_sigma);
    brighten_and_fade(&mut layer, params.brightness);

    GlintLayer::from_image(layer)
}

/// Replace every pixel's alpha with the mapping of its color.
pub fn recolor_alpha(image: &mut RgbaImage, mapping: &impl AlphaMapping) {
    let pixels: &mut [u8] = image;
    pixels.par_chunks_exact_mut(4).for_each(|px| {
        px[3] = mapping.alpha([px[0], px[1], px[2]]);
    });
}

/// Scale RGB by `brightness` (saturating) and halve alpha.
fn brighten_and_fade(image: &mut RgbaImage, brightness: f32) {
    let pixels: &mut [u8] = image;
    pixels.par_chunks_exact_mut(4).for_each(|px| {
        for c in &mut px[..3] {
            *c = (f32::from(*c) * brightness).round().clamp(0.0, 255.0) as u8;
        }
        px[3] /= 2;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::Rgba;

    fn uniform_texture(size: u32, color: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([color[0], color[1], color[2], 255]))
    }

    #[test]
    fn reference_color_is_fully_opaque() {
        let mapping = ColorDistanceAlpha::enchantment();
        assert_eq!(mapping.alpha([112, 68, 159]), 255);
    }

    #[test]
    fn background_color_is_partially_transparent() {
        // (26, 8, 48): distance ≈ 1.948 → 255 - 166
        let mapping = ColorDistanceAlpha::enchantment();
        assert_eq!(mapping.alpha([26, 8, 48]), 89);
    }

    #[test]
    fn colors_brighter_than_reference_clamp_to_opaque() {
        let mapping = ColorDistanceAlpha::enchantment();
        assert_eq!(mapping.alpha([255, 255, 255]), 255);
    }

    #[test]
    fn far_colors_clamp_to_transparent() {
        let mapping = ColorDistanceAlpha {
            weight: 400.0,
            ..ColorDistanceAlpha::enchantment()
        };
        assert_eq!(mapping.alpha([0, 0, 0]), 0);
    }

    #[test]
    fn custom_mapping_strategy_is_used() {
        struct Constant(u8);
        impl AlphaMapping for Constant {
            fn alpha(&self, _rgb: [u8; 3]) -> u8 {
                self.0
            }
        }

        let mut img = uniform_texture(2, [1, 2, 3]);
        recolor_alpha(&mut img, &Constant(42));
        assert!(img.pixels().all(|p| p[3] == 42));
    }

    #[test]
    fn prepare_runs_stages_in_order() {
        let backend = MockBackend::with_images(vec![uniform_texture(8, [112, 68, 159])]);
        let params = GlintParams::default();

        prepare_glint(
            &backend,
            Path::new("/glint.png"),
            &params,
            &ColorDistanceAlpha::default(),
        )
        .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Load("/glint.png".to_string()),
                RecordedOp::Upscale {
                    width: 8,
                    height: 8,
                    factor: 4,
                },
                RecordedOp::Blur { sigma: 3.0 },
            ]
        );
    }

    #[test]
    fn prepare_brightens_rgb_and_halves_alpha() {
        let backend = MockBackend::with_images(vec![uniform_texture(2, [112, 68, 159])]);

        let layer = prepare_glint(
            &backend,
            Path::new("/glint.png"),
            &GlintParams::default(),
            &ColorDistanceAlpha::default(),
        )
        .unwrap();

        // 112 * 1.2 = 134.4, 68 * 1.2 = 81.6, 159 * 1.2 = 190.8; alpha 255 / 2
        assert!(layer.image().pixels().all(|p| *p == Rgba([134, 82, 191, 127])));
    }

    #[test]
    fn brightness_saturates() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([250, 10, 0, 255]));
        brighten_and_fade(&mut img, 1.2);
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 12, 0, 127]));
    }

    #[test]
    fn prepare_rejects_scale_below_two() {
        let backend = MockBackend::with_images(vec![uniform_texture(2, [0, 0, 0])]);
        let params = GlintParams {
            scale: 1,
            ..GlintParams::default()
        };

        let result = prepare_glint(
            &backend,
            Path::new("/glint.png"),
            &params,
            &ColorDistanceAlpha::default(),
        );
        assert!(matches!(result, Err(GlintError::InvalidScale(1))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn empty_layer_is_rejected() {
        assert!(matches!(
            GlintLayer::from_image(RgbaImage::new(0, 0)),
            Err(GlintError::EmptyLayer(_))
        ));
        assert!(matches!(
            GlintLayer::from_image(RgbaImage::new(4, 0)),
            Err(GlintError::EmptyLayer(_))
        ));
        assert!(GlintLayer::from_image(RgbaImage::new(1, 1)).is_ok());
    }

    #[test]
    fn empty_texture_is_rejected() {
        let backend = MockBackend::with_images(vec![RgbaImage::new(0, 0)]);
        let result = prepare_glint(
            &backend,
            Path::new("/glint.png"),
            &GlintParams::default(),
            &ColorDistanceAlpha::default(),
        );
        assert!(matches!(result, Err(GlintError::EmptyLayer(_))));
    }

    #[test]
    fn missing_texture_is_asset_error() {
        let result = prepare_glint(
            &RustBackend::new(),
            Path::new("/nonexistent/glint.png"),
            &GlintParams::default(),
            &ColorDistanceAlpha::default(),
        );
        assert!(matches!(result, Err(GlintError::Asset { .. })));
    }

    #[test]
    fn layer_dimensions_are_texture_times_scale() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("glint.png");
        RgbaImage::from_fn(16, 12, |x, y| Rgba([(x * 8) as u8, (y * 10) as u8, 200, 255]))
            .save(&path)
            .unwrap();

        for scale in 2..=6 {
            let params = GlintParams {
                scale,
                ..GlintParams::default()
            };
            let layer = prepare_glint(
                &RustBackend::new(),
                &path,
                &params,
                &ColorDistanceAlpha::default(),
            )
            .unwrap();
            assert_eq!(layer.size(), Size::new(16 * scale, 12 * scale));
        }
    }

    #[test]
    fn layer_alpha_never_exceeds_half() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("glint.png");
        uniform_texture(4, [255, 255, 255]).save(&path).unwrap();

        let layer = prepare_glint(
            &RustBackend::new(),
            &path,
            &GlintParams::default(),
            &ColorDistanceAlpha::default(),
        )
        .unwrap();
        assert!(layer.image().pixels().all(|p| p[3] <= 127));
    }
}
