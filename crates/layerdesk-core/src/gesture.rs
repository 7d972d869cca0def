//! Transform gesture state machine.
//!
//! A gesture starts on pointer-down, produces a set of candidate
//! [`LayerTransform`]s on every pointer-move, and ends on pointer-up or
//! cancel. The candidates are computed from the snapshots taken at
//! pointer-down, never from the live layers, so each move is independent of
//! the previous one.

use crate::config::EditorConfig;
use crate::geometry::{layer_center_world, rotate_vec, top_left_from_center, world_corners};
use crate::group::{apply_group_transform, resize_edge};
use crate::handles::{HandleFrame, HandleKind};
use crate::input::Modifiers;
use crate::layers::{Layer, LayerId, LayerKind, LayerTransform};
use crate::snap::{snap_angle, snap_point};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use std::f64::consts::{PI, TAU};

/// Everything a move/scale/rotate gesture needs from pointer-down.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Layers being edited, as they were at pointer-down.
    pub starts: Vec<Layer>,
    /// Handle grabbed, or `None` for a body drag.
    pub handle: Option<HandleKind>,
    /// Pointer position at pointer-down, in world coordinates.
    pub start_world: Point,
    /// Modifiers held at pointer-down.
    pub modifiers: Modifiers,
    /// Handle frame at pointer-down (the layer's box, or the selection OBB).
    pub frame: HandleFrame,
    /// World point held fixed while scaling.
    pub anchor: Point,
    /// Point rotation angles are measured around.
    pub rotation_origin: Point,
    last_angle: f64,
    sweep: f64,
}

impl TransformContext {
    pub fn new(
        starts: Vec<Layer>,
        handle: Option<HandleKind>,
        start_world: Point,
        modifiers: Modifiers,
        frame: HandleFrame,
    ) -> Self {
        let anchor = match handle {
            Some(kind) => frame.anchor_for(kind, modifiers.alt),
            None => frame.center,
        };
        let rotation_origin = match starts.as_slice() {
            [single] => single.position,
            _ => frame.center,
        };
        let last_angle = angle_between(rotation_origin, start_world);
        Self {
            starts,
            handle,
            start_world,
            modifiers,
            frame,
            anchor,
            rotation_origin,
            last_angle,
            sweep: 0.0,
        }
    }

    pub fn is_group(&self) -> bool {
        self.starts.len() > 1
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.starts.iter().map(Layer::id).collect()
    }

    /// Transforms at pointer-down.
    pub fn before(&self) -> Vec<LayerTransform> {
        self.starts.iter().map(Layer::transform).collect()
    }

    /// Angle swept since pointer-down, unwrapped across the ±π seam.
    ///
    /// This is the accumulated per-move step rather than the plain
    /// `current − start` difference, so a drag that crosses the negative x
    /// axis keeps turning the same way instead of jumping by a full turn.
    /// Within (−π, π] of the start angle both give the same value.
    fn track_angle(&mut self, world: Point) -> f64 {
        let angle = angle_between(self.rotation_origin, world);
        let mut step = angle - self.last_angle;
        if step > PI {
            step -= TAU;
        } else if step < -PI {
            step += TAU;
        }
        self.last_angle = angle;
        self.sweep += step;
        self.sweep
    }
}

/// Gesture states.
#[derive(Debug, Clone, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Move(TransformContext),
    Scale(TransformContext),
    Rotate(TransformContext),
    /// Rectangle selection, in screen coordinates.
    Marquee {
        start: Point,
        current: Point,
        additive: bool,
    },
    /// Viewport drag; `last` is the previous screen position.
    Pan { last: Point },
}

impl GestureState {
    pub fn name(&self) -> &'static str {
        match self {
            GestureState::Idle => "idle",
            GestureState::Move(_) => "move",
            GestureState::Scale(_) => "scale",
            GestureState::Rotate(_) => "rotate",
            GestureState::Marquee { .. } => "marquee",
            GestureState::Pan { .. } => "pan",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    /// The transform context of a move, scale or rotate gesture.
    pub fn context(&self) -> Option<&TransformContext> {
        match self {
            GestureState::Move(ctx) | GestureState::Scale(ctx) | GestureState::Rotate(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Marquee rectangle in screen coordinates.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self {
            GestureState::Marquee { start, current, .. } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }
}

fn angle_between(origin: Point, p: Point) -> f64 {
    let d = p - origin;
    d.y.atan2(d.x)
}

fn snapped_position(position: Point, viewport: &Viewport, config: &EditorConfig) -> Point {
    if config.snap_enabled {
        snap_point(position, viewport, config.snap_radius_px).point
    } else {
        position
    }
}

/// Body drag: the pointer delta added to every start position.
///
/// For a single layer the new position is snapped; a group snaps its frame's
/// first corner and shifts every member by the same amount.
pub fn move_transforms(
    ctx: &TransformContext,
    world: Point,
    viewport: &Viewport,
    config: &EditorConfig,
) -> Vec<LayerTransform> {
    let delta = world - ctx.start_world;
    let reference = match ctx.starts.as_slice() {
        [single] => single.position,
        _ => ctx.frame.corners[0],
    };
    let delta = snapped_position(reference + delta, viewport, config) - reference;

    let mut transforms: Vec<LayerTransform> = ctx
        .starts
        .iter()
        .map(|layer| LayerTransform {
            position: layer.position + delta,
            ..layer.transform()
        })
        .collect();
    finish(ctx, &mut transforms, viewport, config);
    transforms
}

/// Rotation handle drag.
///
/// The swept angle is damped and added to the start rotation, optionally
/// snapped (shift). A single layer pivots about its own centre; a group
/// rotates about its pivot.
pub fn rotate_transforms(
    ctx: &mut TransformContext,
    world: Point,
    modifiers: Modifiers,
    viewport: &Viewport,
    config: &EditorConfig,
) -> Vec<LayerTransform> {
    let delta = ctx.track_angle(world) * config.rotation_damping;

    let mut transforms = if ctx.is_group() {
        let delta = if modifiers.shift {
            snap_angle(delta, config.angle_snap_degrees)
        } else {
            delta
        };
        apply_group_transform(&ctx.starts, &ctx.ids(), delta, 1.0, config)
    } else {
        ctx.starts
            .iter()
            .map(|layer| {
                let mut rotation = layer.rotation + delta;
                if modifiers.shift {
                    rotation = snap_angle(rotation, config.angle_snap_degrees);
                }
                let center = layer_center_world(layer);
                LayerTransform {
                    position: top_left_from_center(center, rotation, layer.size(), layer.scale),
                    rotation,
                    ..layer.transform()
                }
            })
            .collect()
    };
    finish(ctx, &mut transforms, viewport, config);
    transforms
}

/// Damped scale factor from a pointer and anchor in a box's local frame.
///
/// `ratio = |pointer − anchor| / |half_extents · start_scale|`, and the
/// result is `start_scale · (1 + (ratio − 1) · damping)`.
pub fn damped_scale(
    local_pointer: Point,
    local_anchor: Point,
    half_extents: Vec2,
    start_scale: f64,
    damping: f64,
) -> f64 {
    let reach = (half_extents * start_scale).hypot();
    let reach = if reach == 0.0 { 1.0 } else { reach };
    let ratio = (local_pointer - local_anchor).hypot() / reach;
    start_scale * (1.0 + (ratio - 1.0) * damping)
}

/// Scale handle drag, keeping the anchor fixed in world space.
pub fn scale_transforms(
    ctx: &TransformContext,
    world: Point,
    viewport: &Viewport,
    config: &EditorConfig,
) -> Vec<LayerTransform> {
    let mut transforms = if ctx.is_group() {
        let corners = ctx.frame.corners;
        let half = Vec2::new(
            (corners[1] - corners[0]).hypot() / 2.0,
            (corners[3] - corners[0]).hypot() / 2.0,
        );
        let scale = damped_scale(world, ctx.anchor, half, 1.0, config.scale_damping);
        apply_group_transform(&ctx.starts, &ctx.ids(), 0.0, config.clamp_layer_scale(scale), config)
    } else {
        ctx.starts
            .iter()
            .map(|layer| scale_single(layer, ctx.anchor, world, viewport, config))
            .collect()
    };
    finish(ctx, &mut transforms, viewport, config);
    transforms
}

fn scale_single(
    layer: &Layer,
    anchor: Point,
    world: Point,
    viewport: &Viewport,
    config: &EditorConfig,
) -> LayerTransform {
    let size = layer.size();
    let local_anchor = layer.local_point(anchor);
    let local_pointer = layer.local_point(world);
    let half = size.to_vec2() / 2.0;
    let scale = config.clamp_layer_scale(damped_scale(
        local_pointer,
        local_anchor,
        half,
        layer.scale,
        config.scale_damping,
    ));

    let (next, anchor_offset) = match &layer.kind {
        LayerKind::Raster(raster) => {
            let factor = scale / layer.scale;
            let next_size = Size::new(
                resize_edge(raster.width, factor, config.min_raster_edge),
                resize_edge(raster.height, factor, config.min_raster_edge),
            );
            let fx = next_size.width / nonzero(raster.width);
            let fy = next_size.height / nonzero(raster.height);
            let offset = Vec2::new(local_anchor.x * fx, local_anchor.y * fy);
            let next = LayerTransform {
                scale: 1.0,
                size: Some(next_size),
                ..layer.transform()
            };
            (next, offset)
        }
        _ => {
            let next = LayerTransform {
                scale,
                ..layer.transform()
            };
            (next, local_anchor.to_vec2() * scale)
        }
    };

    let position = anchor - rotate_vec(anchor_offset, layer.rotation);
    LayerTransform {
        position: snapped_position(position, viewport, config),
        ..next
    }
}

fn nonzero(value: f64) -> f64 {
    if value == 0.0 { 1.0 } else { value }
}

fn finish(
    ctx: &TransformContext,
    transforms: &mut [LayerTransform],
    viewport: &Viewport,
    config: &EditorConfig,
) {
    if config.clamp_to_viewport {
        clamp_to_viewport(&ctx.starts, transforms, viewport);
    }
}

/// Translate `transforms` by the smallest amount that keeps every corner of
/// the transformed layers on screen. Does nothing without a screen size.
pub fn clamp_to_viewport(starts: &[Layer], transforms: &mut [LayerTransform], viewport: &Viewport) {
    if !viewport.has_screen() {
        return;
    }
    let mut bounds: Option<Rect> = None;
    for transform in transforms.iter() {
        let Some(start) = starts.iter().find(|layer| layer.id() == transform.id) else {
            continue;
        };
        let mut layer = start.clone();
        layer.apply_transform(transform);
        for corner in world_corners(&layer) {
            let screen = viewport.world_to_screen(corner);
            bounds = Some(match bounds {
                Some(rect) => rect.union_pt(screen),
                None => Rect::from_points(screen, screen),
            });
        }
    }
    let Some(rect) = bounds else {
        return;
    };

    let Size { width, height } = viewport.screen_size;
    let mut dx = 0.0;
    let mut dy = 0.0;
    if rect.x0 < 0.0 {
        dx = -rect.x0;
    }
    if rect.y0 < 0.0 {
        dy = -rect.y0;
    }
    if rect.x1 + dx > width {
        dx -= rect.x1 + dx - width;
    }
    if rect.y1 + dy > height {
        dy -= rect.y1 + dy - height;
    }
    if dx != 0.0 || dy != 0.0 {
        let shift = Vec2::new(dx, dy) / viewport.scale;
        for transform in transforms.iter_mut() {
            transform.position += shift;
        }
    }
}
