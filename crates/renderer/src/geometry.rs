//! Screen-space geometry of the blob.
//!
//! All shape math runs in aspect-corrected normalised device coordinates: `y`
//! spans `[-1, 1]` bottom to top and `x` spans `[-aspect, aspect]`. The glass
//! shader receives the same constants through its generated prelude so the
//! hit region tracks the visible shape.

use winit::dpi::PhysicalSize;

/// Current drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn from_size(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pointer position mapped to the drag controls: `x` in `[-1, 1]` left to
    /// right, `y` in `[0, 1]` bottom to top.
    pub fn raw_pointer(&self, x: f64, y: f64) -> [f32; 2] {
        let raw_x = (x as f32 / self.width as f32) * 2.0 - 1.0;
        let raw_y = 1.0 - y as f32 / self.height as f32;
        [raw_x, raw_y]
    }

    /// Pointer position in aspect-corrected NDC.
    pub fn to_ndc(&self, x: f64, y: f64) -> [f32; 2] {
        let ndc_x = ((x as f32 / self.width as f32) * 2.0 - 1.0) * self.aspect_ratio();
        let ndc_y = -((y as f32 / self.height as f32) * 2.0 - 1.0);
        [ndc_x, ndc_y]
    }
}

/// Placement and hit extents of the blob as functions of drag and sway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobGeometry {
    /// Vertical center while fully closed (below the bottom edge).
    pub center_y_closed: f32,
    /// Vertical distance travelled between closed and open.
    pub center_y_travel: f32,
    /// Horizontal center shift per unit of sway.
    pub sway_shift: f32,
    pub closed_half_extent: [f32; 2],
    pub open_half_extent: [f32; 2],
}

impl Default for BlobGeometry {
    fn default() -> Self {
        Self {
            center_y_closed: -1.3,
            center_y_travel: 2.2,
            sway_shift: 0.1,
            closed_half_extent: [0.45, 0.45],
            open_half_extent: [0.8, 0.3],
        }
    }
}

impl BlobGeometry {
    pub fn center(&self, drag_progress: f32, sway_progress: f32) -> [f32; 2] {
        [
            sway_progress * self.sway_shift,
            self.center_y_closed + drag_progress * self.center_y_travel,
        ]
    }

    pub fn half_extent(&self, drag_progress: f32) -> [f32; 2] {
        let t = drag_progress.clamp(0.0, 1.0);
        [
            lerp(self.closed_half_extent[0], self.open_half_extent[0], t),
            lerp(self.closed_half_extent[1], self.open_half_extent[1], t),
        ]
    }

    pub(crate) fn hit_region(&self, drag_progress: f32, sway_progress: f32, margin: [f32; 2]) -> HitRegion {
        HitRegion {
            center: self.center(drag_progress, sway_progress),
            half_extent: self.half_extent(drag_progress),
            margin,
        }
    }
}

/// Axis-aligned grab area around the blob, padded per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HitRegion {
    pub center: [f32; 2],
    pub half_extent: [f32; 2],
    pub margin: [f32; 2],
}

impl HitRegion {
    pub(crate) fn contains(&self, point: [f32; 2]) -> bool {
        let dx = (point[0] - self.center[0]).abs();
        let dy = (point[1] - self.center[1]).abs();
        dx < self.half_extent[0] + self.margin[0] && dy < self.half_extent[1] + self.margin[1]
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from * (1.0 - t) + to * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_never_collapses_to_zero() {
        let viewport = Viewport::new(0, 0);
        assert_eq!((viewport.width(), viewport.height()), (1, 1));
        assert_eq!(viewport.aspect_ratio(), 1.0);
    }

    #[test]
    fn raw_pointer_spans_expected_ranges() {
        let viewport = Viewport::new(800, 400);
        assert_eq!(viewport.raw_pointer(0.0, 400.0), [-1.0, 0.0]);
        assert_eq!(viewport.raw_pointer(800.0, 0.0), [1.0, 1.0]);
        assert_eq!(viewport.raw_pointer(400.0, 200.0), [0.0, 0.5]);
    }

    #[test]
    fn ndc_is_aspect_corrected() {
        let viewport = Viewport::new(800, 400);
        assert_eq!(viewport.to_ndc(800.0, 0.0), [2.0, 1.0]);
        assert_eq!(viewport.to_ndc(400.0, 400.0), [0.0, -1.0]);
    }

    #[test]
    fn extents_interpolate_between_closed_and_open() {
        let geometry = BlobGeometry::default();
        assert_eq!(geometry.half_extent(0.0), [0.45, 0.45]);
        assert_eq!(geometry.half_extent(1.0), [0.8, 0.3]);
        let mid = geometry.half_extent(0.5);
        assert!((mid[0] - 0.625).abs() < 1e-6);
        assert!((mid[1] - 0.375).abs() < 1e-6);
    }

    #[test]
    fn center_follows_drag_and_sway() {
        let geometry = BlobGeometry::default();
        assert_eq!(geometry.center(0.0, 0.0), [0.0, -1.3]);
        let open = geometry.center(1.0, 2.0);
        assert!((open[0] - 0.2).abs() < 1e-6);
        assert!((open[1] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn margin_is_applied_per_axis() {
        let region = HitRegion {
            center: [0.0, 0.0],
            half_extent: [0.5, 0.2],
            margin: [0.1, 0.15],
        };
        assert!(region.contains([0.59, 0.0]));
        assert!(!region.contains([0.61, 0.0]));
        assert!(region.contains([0.0, 0.34]));
        assert!(!region.contains([0.0, 0.36]));
        assert!(!region.contains([0.59, 0.36]));
    }
}
