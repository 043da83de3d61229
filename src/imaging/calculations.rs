//! Pure calculation functions for the scrolling glint window.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Blit, Offset, Rect, Size};

/// Per-frame movement of the sampling window over the glint layer.
///
/// The window slides left and down by two pixels each frame, which is what
/// produces the diagonal sweep of the shimmer.
pub const DRIFT: Offset = Offset { x: -2, y: 2 };

/// Scroll offset of the sampling window at a given frame index.
///
/// Frame `i` sits at `(-2i, 2i)`; frame 0 starts at the origin.
pub fn scroll_offset(frame_index: u32) -> Offset {
    let i = i64::from(frame_index);
    Offset {
        x: DRIFT.x * i,
        y: DRIFT.y * i,
    }
}

/// Reduce an unbounded scroll offset into the layer's tiling period.
///
/// Negative offsets wrap to the far edge: with a 32px layer, `-2` becomes
/// `30`. The result always satisfies `x < layer.width` and `y < layer.height`.
pub fn crop_origin(offset: Offset, layer: Size) -> (u32, u32) {
    let x = offset.x.rem_euclid(i64::from(layer.width));
    let y = offset.y.rem_euclid(i64::from(layer.height));
    (x as u32, y as u32)
}

/// Plan the masked pastes that cover a canvas with a wrapped glint window.
///
/// The window of canvas size starting at `crop` may run off the right edge,
/// the bottom edge, or both. Each overflow is wrapped to the opposite edge
/// of the layer:
///
/// ```text
/// crosses right | crosses bottom | blits
/// --------------+----------------+-----------
///      no       |       no       | A
///      yes      |       no       | A, C
///      no       |       yes      | A, D
///      yes      |       yes      | A, B, C, D
/// ```
///
/// Later blits patch areas next to (and partly over) what A painted, so the
/// order of the returned list is significant.
///
/// When the canvas is larger than the layer the wrapped extents are clamped
/// to the layer; pixels beyond it would be fully transparent anyway.
pub fn plan_blits(crop: (u32, u32), layer: Size, canvas: Size) -> Vec<Blit> {
    let (cx, cy) = crop;
    let stop_x = cx + canvas.width;
    let stop_y = cy + canvas.height;
    let overflow_x = stop_x.saturating_sub(layer.width);
    let overflow_y = stop_y.saturating_sub(layer.height);

    let main_w = stop_x.min(layer.width) - cx;
    let main_h = stop_y.min(layer.height) - cy;
    let wrap_w = overflow_x.min(layer.width);
    let wrap_h = overflow_y.min(layer.height);

    let mut blits = vec![Blit {
        src: Rect::new(cx, cy, main_w, main_h),
        dest: (0, 0),
    }];

    let crosses_right = overflow_x > 0;
    let crosses_bottom = overflow_y > 0;

    if crosses_right && crosses_bottom {
        blits.push(Blit {
            src: Rect::new(0, 0, wrap_w, wrap_h),
            dest: (canvas.width - overflow_x, canvas.height - overflow_y),
        });
    }
    if crosses_right {
        blits.push(Blit {
            src: Rect::new(0, cy, wrap_w, main_h),
            dest: (canvas.width - overflow_x, 0),
        });
    }
    if crosses_bottom {
        blits.push(Blit {
            src: Rect::new(cx, 0, main_w, wrap_h),
            dest: (0, canvas.height - overflow_y),
        });
    }

    blits
}

/// Dimensions after an integer upscale.
pub fn scaled_size(size: Size, factor: u32) -> Size {
    Size::new(size.width * factor, size.height * factor)
}
