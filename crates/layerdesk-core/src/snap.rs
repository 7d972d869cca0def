//! Snap functionality for aligning points to the screen edges and centre.

use crate::viewport::Viewport;
use kurbo::Point;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point in world coordinates.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a world point so that its screen projection lands on the left,
/// centre or right (top, centre or bottom) screen line when it is within
/// `radius_px` of one. Later targets win when several are in range.
pub fn snap_point(world: Point, viewport: &Viewport, radius_px: f64) -> SnapResult {
    let screen = viewport.world_to_screen(world);
    let (scale, offset, screen_size) = (viewport.scale, viewport.offset, viewport.screen_size);
    let mut result = SnapResult::none(world);

    for tx in [0.0, screen_size.width / 2.0, screen_size.width] {
        if (screen.x - tx).abs() <= radius_px {
            result.point.x = (tx - offset.x) / scale;
            result.snapped_x = true;
        }
    }
    for ty in [0.0, screen_size.height / 2.0, screen_size.height] {
        if (screen.y - ty).abs() <= radius_px {
            result.point.y = (ty - offset.y) / scale;
            result.snapped_y = true;
        }
    }
    result
}

/// Round an angle in radians to the nearest multiple of `step_degrees`.
pub fn snap_angle(angle: f64, step_degrees: f64) -> f64 {
    let step = step_degrees.to_radians();
    if step <= 0.0 {
        return angle;
    }
    (angle / step).round() * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;
    use std::f64::consts::PI;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new();
        viewport.set_screen_size(800.0, 600.0);
        viewport
    }

    #[test]
    fn test_snap_to_left_edge() {
        let result = snap_point(Point::new(5.0, 200.0), &viewport(), 8.0);
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert!((result.point.x - 0.0).abs() < f64::EPSILON);
        assert!((result.point.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_to_centre_with_offset_and_zoom() {
        let mut viewport = viewport();
        viewport.offset = Vec2::new(100.0, 50.0);
        viewport.scale = 2.0;
        // Screen centre (400, 300) is world (150, 125).
        let result = snap_point(Point::new(151.0, 126.5), &viewport, 8.0);
        assert!(result.snapped_x && result.snapped_y);
        assert!((result.point.x - 150.0).abs() < 1e-12);
        assert!((result.point.y - 125.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_snap_outside_radius() {
        let result = snap_point(Point::new(200.0, 200.0), &viewport(), 8.0);
        assert!(!result.is_snapped());
        assert_eq!(result.point, Point::new(200.0, 200.0));
    }

    #[test]
    fn test_snap_angle() {
        let snapped = snap_angle(0.27, 15.0);
        assert!((snapped - PI / 12.0).abs() < 1e-12);
        assert!((snap_angle(-0.1, 15.0) - 0.0).abs() < 1e-12);
    }
}
