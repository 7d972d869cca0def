//! Restoring layers to their creation-time transform, and checking that
//! reset actually does so.

use crate::history::Command;
use crate::layers::{BaselineSize, Layer, LayerId, LayerKind, LayerTransform};
use crate::store::LayerStore;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Offsets applied by the self-check before resetting.
const CHECK_OFFSET: Vec2 = Vec2::new(13.0, 7.0);
const CHECK_ROTATION: f64 = 0.3;
const CHECK_SCALE: f64 = 1.5;

/// Outcome of a reset self-check for one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetCheck {
    pub id: LayerId,
    /// Reset brought the layer exactly back to its baseline.
    pub ok: bool,
    /// Fields that differed from the baseline before the check ran.
    pub differences: Vec<String>,
}

/// Fields of `layer` that differ from its baseline: any of `x`, `y`,
/// `rotation`, `width`, `height`, `scale`.
pub fn baseline_differences(layer: &Layer) -> Vec<String> {
    let baseline = layer.baseline();
    let mut out = Vec::new();
    if layer.position.x != baseline.x {
        out.push("x");
    }
    if layer.position.y != baseline.y {
        out.push("y");
    }
    if layer.rotation != baseline.rotation {
        out.push("rotation");
    }
    match (&layer.kind, baseline.size) {
        (LayerKind::Raster(raster), BaselineSize::Raster { width, height }) => {
            if raster.width != width {
                out.push("width");
            }
            if raster.height != height {
                out.push("height");
            }
            if layer.scale != 1.0 {
                out.push("scale");
            }
        }
        (_, BaselineSize::Scaled { scale }) => {
            if layer.scale != scale {
                out.push("scale");
            }
        }
        // A baseline recorded for another kind never matches.
        _ => out.push("scale"),
    }
    out.into_iter().map(String::from).collect()
}

/// Exact comparison against the baseline.
pub fn is_layer_at_original(layer: &Layer) -> bool {
    baseline_differences(layer).is_empty()
}

/// Put one layer back on its baseline. Locked layers are left alone.
pub fn reset_layer(layer: &mut Layer) -> bool {
    if layer.locked {
        return false;
    }
    let baseline = layer.baseline_transform();
    layer.apply_transform(&baseline);
    true
}

/// An undoable command resetting every unlocked layer among `ids`.
/// Returns `None` when there is nothing to reset.
pub fn reset_command(store: &LayerStore, ids: &[LayerId]) -> Option<Command> {
    let layers: Vec<&Layer> = ids
        .iter()
        .filter_map(|&id| store.layer(id))
        .filter(|layer| !layer.locked)
        .collect();
    if layers.is_empty() {
        return None;
    }
    Some(Command::Transform {
        before: layers.iter().map(|layer| layer.transform()).collect(),
        after: layers.iter().map(|layer| layer.baseline_transform()).collect(),
    })
}

fn perturbed(layer: &Layer) -> LayerTransform {
    let mut transform = layer.transform();
    transform.position += CHECK_OFFSET;
    transform.rotation += CHECK_ROTATION;
    match transform.size.as_mut() {
        Some(size) => {
            size.width *= CHECK_SCALE;
            size.height *= CHECK_SCALE;
        }
        None => transform.scale *= CHECK_SCALE,
    }
    transform
}

/// Perturb, reset and compare every unlocked layer among `ids`.
///
/// The check runs on copies of the layers, so the store is never mutated
/// and subscribers see no events.
pub fn self_check(store: &LayerStore, ids: &[LayerId]) -> Vec<ResetCheck> {
    let results: Vec<ResetCheck> = ids
        .iter()
        .filter_map(|&id| store.layer(id))
        .filter(|layer| !layer.locked)
        .map(check_layer)
        .collect();
    for check in &results {
        log_check(check);
    }
    results
}

fn check_layer(layer: &Layer) -> ResetCheck {
    let differences = baseline_differences(layer);
    let mut copy = layer.clone();
    copy.apply_transform(&perturbed(layer));
    let ok = reset_layer(&mut copy) && is_layer_at_original(&copy);
    ResetCheck {
        id: layer.id(),
        ok,
        differences,
    }
}

fn log_check(check: &ResetCheck) {
    if check.ok {
        log::debug!("Reset self-check passed for {}", check.id);
    } else {
        log::warn!("Reset self-check failed for {}", check.id);
    }
}
