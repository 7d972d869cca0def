//! World-space geometry of layers: corners, centres, oriented boxes and
//! separating-axis tests.

mod obb;
mod sat;

pub use obb::{Obb, compute_obb, selection_obb};
pub use sat::{polygon_aabb_contained, polygon_aabb_intersect};

use crate::layers::Layer;
use kurbo::{Point, Size, Vec2};

/// Rotate a vector by `angle` radians.
pub fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}

/// Unit vector, or `fallback` for a zero-length input.
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.hypot();
    if len == 0.0 || !len.is_finite() { fallback } else { v / len }
}

/// Unscaled local bounds of a layer.
pub fn layer_bounds(layer: &Layer) -> Size {
    layer.size()
}

/// The four world-space corners, clockwise from the local top-left:
/// `(0,0)`, `(w,0)`, `(w,h)`, `(0,h)`.
pub fn world_corners(layer: &Layer) -> [Point; 4] {
    let Size { width, height } = layer.size();
    let local = [
        Vec2::new(0.0, 0.0),
        Vec2::new(width, 0.0),
        Vec2::new(width, height),
        Vec2::new(0.0, height),
    ];
    local.map(|p| layer.position + rotate_vec(p * layer.scale, layer.rotation))
}

/// Midpoints of the four edges: top, right, bottom, left.
pub fn side_midpoints(corners: &[Point; 4]) -> [Point; 4] {
    [
        corners[0].midpoint(corners[1]),
        corners[1].midpoint(corners[2]),
        corners[2].midpoint(corners[3]),
        corners[3].midpoint(corners[0]),
    ]
}

/// World-space centre of a layer's bounds.
pub fn layer_center_world(layer: &Layer) -> Point {
    let half = layer.size().to_vec2() * (layer.scale / 2.0);
    layer.position + rotate_vec(half, layer.rotation)
}

/// Top-left position that puts a box of `size * scale`, rotated by
/// `rotation`, at `center`.
pub fn top_left_from_center(center: Point, rotation: f64, size: Size, scale: f64) -> Point {
    let half = size.to_vec2() * (scale / 2.0);
    center - rotate_vec(half, rotation)
}
