//! Rotate and scale a multi-selection about its shared pivot.

use crate::config::EditorConfig;
use crate::geometry::{layer_center_world, rotate_vec, selection_obb, top_left_from_center};
use crate::layers::{Layer, LayerId, LayerKind, LayerTransform};
use kurbo::{Point, Size};

/// Resize one raster edge by `factor`, never below one pixel.
/// An identity factor leaves the edge untouched.
pub(crate) fn resize_edge(edge: f64, factor: f64, min_edge: f64) -> f64 {
    if factor == 1.0 {
        edge
    } else {
        (edge * factor).round().max(min_edge)
    }
}

/// Centre of the selection OBB of the visible, unlocked members of `ids`.
pub fn group_pivot(layers: &[Layer], ids: &[LayerId]) -> Option<Point> {
    selection_obb(layers.iter().filter(|layer| ids.contains(&layer.id()))).map(|obb| obb.center)
}

/// New transforms for every visible, unlocked member of `ids` after rotating
/// by `delta_rotation` and scaling by `scale` about the group pivot.
///
/// Rasters resize their pixel dimensions and keep scale 1; other kinds
/// multiply their scale. Both are clamped to the configured scale range.
pub fn apply_group_transform(
    layers: &[Layer],
    ids: &[LayerId],
    delta_rotation: f64,
    scale: f64,
    config: &EditorConfig,
) -> Vec<LayerTransform> {
    let Some(pivot) = group_pivot(layers, ids) else {
        return Vec::new();
    };
    let members = layers
        .iter()
        .filter(|layer| ids.contains(&layer.id()) && layer.is_interactive());

    members
        .map(|layer| {
            let offset = rotate_vec(layer_center_world(layer) - pivot, delta_rotation) * scale;
            let center = pivot + offset;
            let rotation = layer.rotation + delta_rotation;

            match &layer.kind {
                LayerKind::Raster(raster) => {
                    let factor = config.clamp_layer_scale(scale);
                    let size = Size::new(
                        resize_edge(raster.width, factor, 1.0),
                        resize_edge(raster.height, factor, 1.0),
                    );
                    LayerTransform {
                        id: layer.id(),
                        position: top_left_from_center(center, rotation, size, 1.0),
                        rotation,
                        scale: 1.0,
                        size: Some(size),
                    }
                }
                _ => {
                    let next_scale = if scale == 1.0 {
                        layer.scale
                    } else {
                        config.clamp_layer_scale(layer.scale * scale)
                    };
                    LayerTransform {
                        id: layer.id(),
                        position: top_left_from_center(center, rotation, layer.size(), next_scale),
                        rotation,
                        scale: next_scale,
                        size: None,
                    }
                }
            }
        })
        .collect()
}
