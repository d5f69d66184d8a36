//! Where stamps land relative to their anchor.
//!
//! All coordinates are PDF user space: points, origin at the bottom-left of
//! the page, `y` growing upwards.

use crate::anchor::Rect;

/// Bottom-left corner for an image of `image_height` points.
///
/// The image starts at the anchor's right edge with its top aligned to the
/// anchor's top, then moves up by `vertical_offset` (down when negative).
pub fn image_origin(anchor: Rect, image_height: f32, vertical_offset: f32) -> (f32, f32) {
    (
        anchor.right(),
        anchor.top() - image_height + vertical_offset,
    )
}

/// Baseline origin for text drawn after the anchor.
///
/// Text starts at the anchor's right edge on the anchor's bottom edge; the
/// origin never leaves the page and whatever runs past `page_width` is
/// clipped by the page box.
pub fn text_origin(anchor: Rect, page_width: f32) -> (f32, f32) {
    (anchor.right().min(page_width).max(0.0), anchor.bottom())
}

/// Whether `opacity` calls for alpha blending. Values at or outside the
/// `0..1` bounds mean fully opaque.
pub fn blends(opacity: f32) -> bool {
    opacity > 0.0 && opacity < 1.0
}
