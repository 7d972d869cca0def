//! Click and marquee selection.

use crate::geometry::{polygon_aabb_contained, polygon_aabb_intersect, world_corners};
use crate::layers::{Layer, LayerId, LayerKind};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How a marquee rectangle matches layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Any overlap selects.
    #[default]
    Intersect,
    /// The layer must lie entirely inside.
    Contain,
}

/// Ordered selected ids plus the most recently selected one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<LayerId>,
    primary: Option<LayerId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection. The last id becomes primary.
    pub fn set(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        self.ids.clear();
        self.extend(ids);
        if self.ids.is_empty() {
            self.primary = None;
        }
    }

    /// Add ids not already selected. The last added id becomes primary.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
            self.primary = Some(id);
        }
    }

    /// Add or remove one id.
    pub fn toggle(&mut self, id: LayerId) {
        if let Some(index) = self.ids.iter().position(|&other| other == id) {
            self.ids.remove(index);
            if self.primary == Some(id) {
                self.primary = self.ids.last().copied();
            }
        } else {
            self.ids.push(id);
            self.primary = Some(id);
        }
    }

    pub fn remove(&mut self, id: LayerId) {
        if self.contains(id) {
            self.toggle(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.primary = None;
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn primary(&self) -> Option<LayerId> {
        self.primary
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Whether a click at `world` lands on an opaque part of `layer`.
fn hits(layer: &Layer, world: Point) -> bool {
    if !layer.contains_point(world) {
        return false;
    }
    match &layer.kind {
        LayerKind::Raster(raster) => raster.is_opaque_at(layer.local_point(world)),
        _ => true,
    }
}

/// Topmost visible, unlocked layer under a world point.
///
/// `layers` is ordered back to front. Transparent raster pixels pass the
/// click through to the layer beneath.
pub fn pick_top_at_point(layers: &[Layer], world: Point) -> Option<LayerId> {
    layers
        .iter()
        .rev()
        .filter(|layer| layer.is_interactive())
        .find(|layer| hits(layer, world))
        .map(Layer::id)
}

/// Visible, unlocked layers matched by a world-space rectangle, topmost first.
pub fn select_by_rect(layers: &[Layer], rect: Rect, mode: SelectionMode) -> Vec<LayerId> {
    let rect = rect.abs();
    layers
        .iter()
        .rev()
        .filter(|layer| layer.is_interactive())
        .filter(|layer| {
            let corners = world_corners(layer);
            match mode {
                SelectionMode::Intersect => polygon_aabb_intersect(&corners, rect),
                SelectionMode::Contain => polygon_aabb_contained(&corners, rect),
            }
        })
        .map(Layer::id)
        .collect()
}
