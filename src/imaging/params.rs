//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the planning code (which decides which regions of the
//! glint layer land where) and the [`backend`](super::backend) (which does
//! the actual pixel work). Keeping them free of pixel data lets blit plans
//! be unit tested without an image backend.
//!
//! ## Types
//!
//! - [`Size`]: Width and height of a buffer in pixels.
//! - [`Offset`]: Signed scroll position of the sampling window.
//! - [`Rect`]: Half-open pixel rectangle inside a source buffer.
//! - [`Blit`]: One masked paste: source rectangle plus destination origin.
//! - [`Quality`]: Lossy encoding quality (1-100, default 90). Clamped on construction.

/// Width and height of an image buffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &image::RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// Signed scroll position of the compositing window over the glint layer.
///
/// Unbounded: it drifts by a fixed step every frame and is only reduced
/// into the layer's period when a crop origin is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

/// Half-open rectangle `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A single masked paste of a glint-layer region onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    /// Region of the glint layer to copy.
    pub src: Rect,
    /// Top-left corner on the canvas where `src` lands.
    pub dest: (u32, u32),
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn rect_with_zero_extent_is_empty() {
        assert!(Rect::new(3, 4, 0, 10).is_empty());
        assert!(Rect::new(3, 4, 10, 0).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }

    #[test]
    fn size_of_image() {
        let img = image::RgbaImage::new(7, 3);
        assert_eq!(Size::of(&img), Size::new(7, 3));
    }
}
