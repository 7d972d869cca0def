//! Editor tunables.

use serde::{Deserialize, Serialize};

/// Handle hit radius in screen pixels.
pub const HANDLE_RADIUS_PX: f64 = 12.0;
/// Distance from the top edge to the rotation handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 30.0;
/// Edge/centre snap radius in screen pixels.
pub const SNAP_RADIUS_PX: f64 = 8.0;
/// Multiplier applied to the raw angular delta of a rotate gesture.
pub const ROTATION_DAMPING: f64 = 0.7;
/// Multiplier applied to `ratio - 1` of a scale gesture.
pub const SCALE_DAMPING: f64 = 0.2;
/// Smallest committed layer scale.
pub const MIN_LAYER_SCALE: f64 = 0.1;
/// Largest committed layer scale.
pub const MAX_LAYER_SCALE: f64 = 5.0;
/// Smallest raster edge produced by a scale gesture, in pixels.
pub const MIN_RASTER_EDGE: f64 = 10.0;
/// Rotation snap increment in degrees.
pub const ANGLE_SNAP_DEGREES: f64 = 15.0;
/// Maximum number of undo entries to keep.
pub const MAX_UNDO_HISTORY: usize = 50;
/// Minimum time between redraws (about 30 Hz).
pub const REDRAW_INTERVAL_MS: u64 = 33;

/// Runtime configuration for an [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Handle hit radius in screen pixels.
    pub handle_radius_px: f64,
    /// Rotation handle offset above the top edge, in screen pixels.
    pub rotate_handle_offset_px: f64,
    /// Whether moved/scaled positions snap to the screen edges and centre.
    pub snap_enabled: bool,
    /// Snap radius in screen pixels.
    pub snap_radius_px: f64,
    pub rotation_damping: f64,
    pub scale_damping: f64,
    pub min_layer_scale: f64,
    pub max_layer_scale: f64,
    pub min_raster_edge: f64,
    /// Rotation snap increment in degrees (applied while shift is held).
    pub angle_snap_degrees: f64,
    /// Keep dragged layers fully on screen.
    pub clamp_to_viewport: bool,
    pub viewport_min_scale: f64,
    pub viewport_max_scale: f64,
    /// Keep the content rectangle covering the screen while panning/zooming.
    pub viewport_limits: bool,
    pub history_limit: usize,
    /// Minimum time between redraws in milliseconds.
    pub redraw_interval_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_radius_px: HANDLE_RADIUS_PX,
            rotate_handle_offset_px: ROTATE_HANDLE_OFFSET_PX,
            snap_enabled: true,
            snap_radius_px: SNAP_RADIUS_PX,
            rotation_damping: ROTATION_DAMPING,
            scale_damping: SCALE_DAMPING,
            min_layer_scale: MIN_LAYER_SCALE,
            max_layer_scale: MAX_LAYER_SCALE,
            min_raster_edge: MIN_RASTER_EDGE,
            angle_snap_degrees: ANGLE_SNAP_DEGREES,
            clamp_to_viewport: true,
            viewport_min_scale: 0.05,
            viewport_max_scale: 20.0,
            viewport_limits: false,
            history_limit: MAX_UNDO_HISTORY,
            redraw_interval_ms: REDRAW_INTERVAL_MS,
        }
    }
}

impl EditorConfig {
    /// Clamp a layer scale factor into the committed range.
    pub fn clamp_layer_scale(&self, scale: f64) -> f64 {
        scale.max(self.min_layer_scale).min(self.max_layer_scale)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
