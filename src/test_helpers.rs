//! Shared test utilities for the enchant-glint test suite.
//!
//! Provides synthetic sprites, glint layers, and frame sequences so unit
//! tests never depend on real texture assets, plus a few filesystem
//! helpers for asserting on written outputs.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let sprite = write_png(tmp.path(), "boat.png", &ring_sprite(8));
//! let texture = write_glint_texture(tmp.path());
//! ```

use crate::glint::GlintLayer;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// Glint layer whose alpha varies with position, so every scroll step
/// produces a visibly different frame.
pub fn glint_layer(width: u32, height: u32) -> GlintLayer {
    GlintLayer::from_image(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([180, 120, 255, ((x * 37 + y * 11) % 128) as u8])
    }))
    .unwrap()
}

/// Fully opaque grey square.
pub fn opaque_square(size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, Rgba([90, 90, 90, 255]))
}

/// Opaque one-pixel ring with a transparent border and center, the shape
/// of a typical item sprite outline.
pub fn ring_sprite(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let edge = size.saturating_sub(2);
        let on_ring = (x == 1 || y == 1 || x == edge || y == edge)
            && (1..=edge).contains(&x)
            && (1..=edge).contains(&y);
        if on_ring {
            Rgba([200, 60, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// `count` distinct opaque frames of `size`×`size`.
pub fn checker_frames(count: u32, size: u32) -> Vec<RgbaImage> {
    (0..count)
        .map(|i| {
            RgbaImage::from_fn(size, size, |x, y| {
                if (x + y + i) % 2 == 0 {
                    Rgba([255, (i * 40) as u8, 0, 255])
                } else {
                    Rgba([0, 0, 255u32.saturating_sub(i * 30) as u8, 255])
                }
            })
        })
        .collect()
}

// =========================================================================
// Filesystem
// =========================================================================

/// Save `image` as PNG into `dir` and return its path.
pub fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// Write a small purple texture that the stock alpha mapping turns into a
/// visible glint.
pub fn write_glint_texture(dir: &Path) -> PathBuf {
    let texture = RgbaImage::from_fn(8, 8, |x, y| {
        let fade = ((x + y) * 6) as u8;
        Rgba([112 - fade, 68 - fade / 2, 159 - fade, 255])
    });
    write_png(dir, "glint.png", &texture)
}

/// Number of entries directly inside `dir`.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
