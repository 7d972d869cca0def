//! Separating-axis tests between a layer quad and an axis-aligned rectangle.

use super::normalize_or;
use kurbo::{Point, Rect, Vec2};

fn project(points: &[Point], axis: Vec2) -> (f64, f64) {
    points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
        let d = p.to_vec2().dot(axis);
        (min.min(d), max.max(d))
    })
}

/// Whether a rectangle-shaped quad (corners in winding order) overlaps `rect`.
///
/// Tests the quad's two edge directions and the two global axes.
pub fn polygon_aabb_intersect(corners: &[Point; 4], rect: Rect) -> bool {
    let rect = rect.abs();
    let rect_points = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let axes = [
        normalize_or(corners[1] - corners[0], Vec2::new(1.0, 0.0)),
        normalize_or(corners[3] - corners[0], Vec2::new(0.0, 1.0)),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
    ];
    axes.iter().all(|&axis| {
        let (a_min, a_max) = project(corners, axis);
        let (b_min, b_max) = project(&rect_points, axis);
        a_max >= b_min && b_max >= a_min
    })
}

/// Whether every corner lies inside `rect` (edges inclusive).
pub fn polygon_aabb_contained(corners: &[Point; 4], rect: Rect) -> bool {
    let rect = rect.abs();
    corners
        .iter()
        .all(|p| p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1)
}
