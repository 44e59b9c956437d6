//! Selection rectangle geometry.
//!
//! Pure value logic shared by the overlay (pointer tracking) and the
//! orchestrator (noise filter before cropping).

use serde::{Deserialize, Serialize};

/// Default minimum edge length, in pixels, for a selection to count.
/// Anything at or below this is treated as an accidental click.
pub const MIN_SELECTION_PX: u32 = 10;

/// Axis-aligned rectangle in overlay-local pixel coordinates.
///
/// Always normalized: `x`/`y` is the top-left corner and the size is
/// never negative, whichever direction the user dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from two arbitrary drag points.
    ///
    /// Points left of or above the surface origin are clamped to 0.
    pub fn from_points(a: (i32, i32), b: (i32, i32)) -> Self {
        let left = a.0.min(b.0).max(0);
        let right = a.0.max(b.0).max(0);
        let top = a.1.min(b.1).max(0);
        let bottom = a.1.max(b.1).max(0);

        Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }

    /// True when both edges are strictly longer than `min_px`.
    pub fn exceeds(&self, min_px: u32) -> bool {
        self.width > min_px && self.height > min_px
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// True when the rectangle lies entirely inside a `width`×`height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_direction_does_not_matter() {
        let backwards = SelectionRect::from_points((100, 100), (40, 60));
        let forwards = SelectionRect::from_points((40, 60), (100, 100));
        assert_eq!(backwards, SelectionRect::new(40, 60, 60, 40));
        assert_eq!(backwards, forwards);
    }

    #[test]
    fn mixed_direction_drag_normalizes() {
        let rect = SelectionRect::from_points((100, 20), (30, 90));
        assert_eq!(rect, SelectionRect::new(30, 20, 70, 70));
    }

    #[test]
    fn negative_points_clamp_to_origin() {
        let rect = SelectionRect::from_points((-15, -5), (40, 30));
        assert_eq!(rect, SelectionRect::new(0, 0, 40, 30));
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!SelectionRect::new(0, 0, 10, 50).exceeds(MIN_SELECTION_PX));
        assert!(!SelectionRect::new(0, 0, 50, 10).exceeds(MIN_SELECTION_PX));
        assert!(SelectionRect::new(0, 0, 11, 11).exceeds(MIN_SELECTION_PX));
    }

    #[test]
    fn fits_within_checks_far_edges() {
        let rect = SelectionRect::new(150, 150, 50, 50);
        assert!(rect.fits_within(200, 200));
        assert!(!rect.fits_within(199, 200));
        assert!(!SelectionRect::new(u32::MAX, 0, 1, 1).fits_within(200, 200));
    }
}
