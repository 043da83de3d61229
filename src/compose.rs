//! Frame compositing.
//!
//! Produces the animated sequence for one source image. The source is
//! upscaled once; every frame is a copy of it with a window of the glint
//! layer pasted on top, masked by the source's own alpha. The window's
//! origin drifts by [`DRIFT`](crate::imaging::DRIFT) per frame and wraps
//! around the layer, so the glint tiles seamlessly however long the
//! animation runs.
//!
//! Two entry points:
//!
//! - [`Frames`]: lazy iterator, one frame resident at a time. The batch
//!   pipeline streams it straight into an encoder.
//! - [`generate_frames`]: collects the whole sequence, reporting progress
//!   before each frame.

use crate::glint::GlintLayer;
use crate::imaging::{ImageBackend, Size, crop_origin, plan_blits, scroll_offset};
use image::RgbaImage;

/// Lazily composited frames for one source image.
pub struct Frames<'a, B: ImageBackend> {
    backend: &'a B,
    glint: &'a GlintLayer,
    canvas: RgbaImage,
    next: u32,
    count: u32,
}

impl<'a, B: ImageBackend> Frames<'a, B> {
    /// Upscale `source` by `input_scale` and prepare `frame_count` frames.
    ///
    /// An `input_scale` of 0 leaves the source at its original size, the
    /// same as 1. Configuration loading rejects 0 before it gets here.
    pub fn new(
        backend: &'a B,
        source: &RgbaImage,
        glint: &'a GlintLayer,
        frame_count: u32,
        input_scale: u32,
    ) -> Self {
        Self {
            backend,
            glint,
            canvas: backend.upscale(source, input_scale.max(1)),
            next: 0,
            count: frame_count,
        }
    }

    /// Size shared by every frame of the sequence.
    pub fn canvas_size(&self) -> Size {
        Size::of(&self.canvas)
    }

    /// Where the glint window starts for frame `index`.
    pub fn crop_origin(&self, index: u32) -> (u32, u32) {
        crop_origin(scroll_offset(index), self.glint.size())
    }

    /// Composite frame `index`. Frames depend only on their index.
    pub fn render(&self, index: u32) -> RgbaImage {
        let mut frame = self.canvas.clone();
        let blits = plan_blits(self.crop_origin(index), self.glint.size(), self.canvas_size());
        for blit in &blits {
            self.backend.composite(&mut frame, self.glint.image(), blit);
        }
        frame
    }
}

impl<B: ImageBackend> Iterator for Frames<'_, B> {
    type Item = RgbaImage;

    fn next(&mut self) -> Option<RgbaImage> {
        if self.next >= self.count {
            return None;
        }
        let frame = self.render(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<B: ImageBackend> ExactSizeIterator for Frames<'_, B> {}

/// Composite the full sequence for `source`.
///
/// `progress` is called with the 1-based frame number before each frame
/// is built. `input_scale` follows [`Frames::new`].
pub fn generate_frames(
    backend: &impl ImageBackend,
    source: &RgbaImage,
    glint: &GlintLayer,
    frame_count: u32,
    input_scale: u32,
    mut progress: impl FnMut(u32),
) -> Vec<RgbaImage> {
    let frames = Frames::new(backend, source, glint, frame_count, input_scale);
    (0..frame_count)
        .map(|i| {
            progress(i + 1);
            frames.render(i)
        })
        .collect()
}
