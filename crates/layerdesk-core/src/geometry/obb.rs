//! Principal-axis oriented bounding boxes.

use super::{normalize_or, world_corners};
use crate::layers::Layer;
use kurbo::{Point, Vec2};

/// An oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Point,
    /// Principal axis.
    pub u: Vec2,
    /// `u` rotated by 90 degrees.
    pub v: Vec2,
    pub half_width: f64,
    pub half_height: f64,
    /// `center ± u·hw ± v·hh`, in the order (+u+v), (−u+v), (−u−v), (+u−v).
    pub vertices: [Point; 4],
}

impl Obb {
    /// Angle of the principal axis in radians.
    pub fn angle(&self) -> f64 {
        self.u.y.atan2(self.u.x)
    }
}

/// Oriented bounding box of a point set along its principal axis.
///
/// The axis is the eigenvector of the largest eigenvalue of the 2×2
/// covariance matrix. Returns `None` for an empty set.
pub fn compute_obb(points: &[Point]) -> Option<Obb> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let mean = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2()) / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let d = p.to_vec2() - mean;
        sxx += d.x * d.x;
        syy += d.y * d.y;
        sxy += d.x * d.y;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;

    let trace = sxx + syy;
    let det = sxx * syy - sxy * sxy;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    let lambda = trace / 2.0 + disc;

    let u = normalize_or(Vec2::new(sxy, lambda - sxx), Vec2::new(1.0, 0.0));
    let v = Vec2::new(-u.y, u.x);

    let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        let d = p.to_vec2() - mean;
        let pu = d.dot(u);
        let pv = d.dot(v);
        min_u = min_u.min(pu);
        max_u = max_u.max(pu);
        min_v = min_v.min(pv);
        max_v = max_v.max(pv);
    }

    let half_width = (max_u - min_u) / 2.0;
    let half_height = (max_v - min_v) / 2.0;
    let center = (mean + u * (min_u + half_width) + v * (min_v + half_height)).to_point();
    let (eu, ev) = (u * half_width, v * half_height);

    Some(Obb {
        center,
        u,
        v,
        half_width,
        half_height,
        vertices: [
            center + eu + ev,
            center - eu + ev,
            center - eu - ev,
            center + eu - ev,
        ],
    })
}

/// Oriented bounding box around the world corners of every visible,
/// unlocked layer in `layers`.
pub fn selection_obb<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Option<Obb> {
    let points: Vec<Point> = layers
        .into_iter()
        .filter(|layer| layer.is_interactive())
        .flat_map(world_corners)
        .collect();
    compute_obb(&points)
}
