//! Manipulation handles around a layer or a group selection.

use crate::geometry::{Obb, layer_center_world, normalize_or, side_midpoints, world_corners};
use crate::layers::Layer;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Type of manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle, indexed clockwise from the top-left.
    Corner(usize),
    /// Edge midpoint handle: 0 top, 1 right, 2 bottom, 3 left.
    Side(usize),
    /// Rotation handle above the top edge.
    Rotate,
}

/// A handle with its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a world point is within `tolerance` world units.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// The box handles are placed on: four corners in winding order and a centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleFrame {
    pub corners: [Point; 4],
    pub center: Point,
}

impl HandleFrame {
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            corners: world_corners(layer),
            center: layer_center_world(layer),
        }
    }

    /// Frame over a selection box, with corner 0 at `center − u·hw − v·hh`.
    pub fn from_obb(obb: &Obb) -> Self {
        let [pp, mp, mm, pm] = obb.vertices;
        Self {
            corners: [mm, pm, pp, mp],
            center: obb.center,
        }
    }

    pub fn sides(&self) -> [Point; 4] {
        side_midpoints(&self.corners)
    }

    /// Rotation handle: `offset_px` screen pixels beyond the top edge,
    /// pointing away from the centre.
    pub fn rotate_handle(&self, viewport_scale: f64, offset_px: f64) -> Point {
        let top_mid = self.corners[0].midpoint(self.corners[1]);
        let dir = normalize_or(top_mid - self.center, self.up());
        top_mid + dir * (offset_px / viewport_scale)
    }

    /// Outward normal of the top edge.
    fn up(&self) -> Vec2 {
        let edge = normalize_or(self.corners[1] - self.corners[0], Vec2::new(1.0, 0.0));
        Vec2::new(edge.y, -edge.x)
    }

    /// Every handle, in hit-test priority order.
    pub fn handles(&self, viewport_scale: f64, offset_px: f64) -> Vec<Handle> {
        let corners = self
            .corners
            .iter()
            .enumerate()
            .map(|(i, &p)| Handle::new(HandleKind::Corner(i), p));
        let sides = self
            .sides()
            .into_iter()
            .enumerate()
            .map(|(i, p)| Handle::new(HandleKind::Side(i), p));
        corners
            .chain(sides)
            .chain(std::iter::once(Handle::new(
                HandleKind::Rotate,
                self.rotate_handle(viewport_scale, offset_px),
            )))
            .collect()
    }

    /// The handle under a world point: corners first, then sides, then the
    /// rotation handle. `radius_px` is in screen pixels.
    pub fn detect(
        &self,
        world: Point,
        viewport_scale: f64,
        radius_px: f64,
        offset_px: f64,
    ) -> Option<Handle> {
        let radius = radius_px / viewport_scale;
        self.handles(viewport_scale, offset_px)
            .into_iter()
            .find(|handle| handle.hit_test(world, radius))
    }

    /// Fixed point for a scale gesture from `handle`: the opposite corner or
    /// side, or the centre when `from_center` is set.
    pub fn anchor_for(&self, kind: HandleKind, from_center: bool) -> Point {
        if from_center {
            return self.center;
        }
        match kind {
            HandleKind::Corner(i) => self.corners[(i + 2) % 4],
            HandleKind::Side(i) => self.sides()[(i + 2) % 4],
            HandleKind::Rotate => self.center,
        }
    }
}

/// Handle of a single layer under a world point.
pub fn detect_handle(
    world: Point,
    layer: &Layer,
    viewport_scale: f64,
    radius_px: f64,
    offset_px: f64,
) -> Option<Handle> {
    HandleFrame::from_layer(layer).detect(world, viewport_scale, radius_px, offset_px)
}

/// Anchor of a single layer for a scale gesture.
pub fn anchor_for_handle(layer: &Layer, kind: HandleKind, from_center: bool) -> Point {
    HandleFrame::from_layer(layer).anchor_for(kind, from_center)
}
