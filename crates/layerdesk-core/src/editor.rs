//! The editor facade: pointer, keyboard and wheel input in; layer store
//! mutations, undo history and change notifications out.

use crate::alpha::AlphaMaskWorker;
use crate::config::EditorConfig;
use crate::geometry::selection_obb;
use crate::gesture::{GestureState, TransformContext, move_transforms, rotate_transforms, scale_transforms};
use crate::handles::{Handle, HandleFrame, HandleKind};
use crate::history::{Command, History};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::layers::{Layer, LayerId, LayerKind, LayerTransform};
use crate::project::Project;
use crate::redraw::RedrawThrottle;
use crate::reset::{self, ResetCheck};
use crate::selection::{SelectionMode, pick_top_at_point, select_by_rect};
use crate::store::{LayerStore, StoreEvent, SubscriptionId};
use crate::tools::ToolKind;
use crate::viewport::Viewport;
use image::RgbaImage;
use kurbo::{Point, Rect, Vec2};
use std::sync::Arc;

/// Marquees smaller than this in both screen dimensions count as a click.
const MIN_MARQUEE_PX: f64 = 1.0;

/// Interactive editing session over a [`LayerStore`].
#[derive(Debug)]
pub struct Editor {
    store: LayerStore,
    history: History,
    viewport: Viewport,
    config: EditorConfig,
    tool: ToolKind,
    selection_mode: SelectionMode,
    gesture: GestureState,
    redraw: RedrawThrottle,
    alpha_worker: AlphaMaskWorker,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let mut viewport = Viewport::default();
        apply_viewport_bounds(&mut viewport, &config);
        Self {
            store: LayerStore::new(),
            history: History::with_limit(config.history_limit),
            viewport,
            redraw: RedrawThrottle::from_millis(config.redraw_interval_ms),
            config,
            tool: ToolKind::default(),
            selection_mode: SelectionMode::default(),
            gesture: GestureState::Idle,
            alpha_worker: AlphaMaskWorker::default(),
        }
    }

    /// Open a saved project. History starts empty; the configured viewport
    /// bounds take precedence over the saved ones.
    pub fn from_project(project: Project, config: EditorConfig) -> Self {
        let mut editor = Self::new(config);
        editor.viewport = project.viewport;
        apply_viewport_bounds(&mut editor.viewport, &editor.config);
        editor.store.reset_contents(project.layers, project.selected_layer_id);
        let rasters: Vec<LayerId> = editor
            .store
            .layers()
            .iter()
            .filter(|layer| layer.is_raster())
            .map(Layer::id)
            .collect();
        for id in rasters {
            editor.request_alpha_mask(id);
        }
        log::info!("Opened project with {} layers", editor.store.len());
        editor
    }

    /// Snapshot the session as a project.
    pub fn project(&self) -> Project {
        Project {
            layers: self.store.layers().to_vec(),
            selected_layer_id: self.store.selection().primary(),
            viewport: self.viewport.clone(),
        }
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn layers(&self) -> &[Layer] {
        self.store.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.store.layer(id)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected_ids(&self) -> Vec<LayerId> {
        self.store.selection().ids().to_vec()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Consume a due redraw request.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    // --- Layers ---

    /// Add a layer on top (undoable). Rasters with pixels get an alpha mask
    /// queued.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id();
        self.history.execute(Command::AddLayer { layer }, &mut self.store);
        self.request_alpha_mask(id);
        self.redraw.request();
        id
    }

    /// Remove a layer (undoable). Returns false for an unknown id.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let Some(command) = Command::remove_layer(&self.store, id) else {
            return false;
        };
        self.history.execute(command, &mut self.store);
        self.redraw.request();
        true
    }

    /// Replace a raster's pixel buffer and queue a new alpha mask.
    pub fn set_layer_pixels(&mut self, id: LayerId, pixels: Arc<RgbaImage>) -> bool {
        let updated = self.store.update_layer(id, |layer| {
            if let LayerKind::Raster(raster) = &mut layer.kind {
                raster.set_pixels(pixels);
            }
        });
        if updated {
            self.request_alpha_mask(id);
            self.redraw.request();
        }
        updated
    }

    /// Record the rendered width of a text layer.
    pub fn set_text_width(&mut self, id: LayerId, width: f64) -> bool {
        self.store.update_layer(id, |layer| {
            if let LayerKind::Text(text) = &mut layer.kind {
                text.set_measured_width(width);
            }
        })
    }

    // --- Alpha masks ---

    /// Queue an alpha mask build for a raster layer that has pixels.
    pub fn request_alpha_mask(&mut self, id: LayerId) -> bool {
        let pixels = match self.store.layer(id).map(|layer| &layer.kind) {
            Some(LayerKind::Raster(raster)) => raster.pixels().cloned(),
            _ => None,
        };
        match pixels {
            Some(pixels) => {
                self.alpha_worker.request(id, pixels);
                true
            }
            None => false,
        }
    }

    /// Attach every alpha mask that has arrived. Returns how many were
    /// attached; masks for removed layers, or built from pixels that have
    /// since been replaced, are dropped.
    pub fn poll_alpha_masks(&mut self) -> usize {
        let mut attached = 0;
        for ready in self.alpha_worker.poll() {
            let current = match self.store.layer(ready.layer).map(|layer| &layer.kind) {
                Some(LayerKind::Raster(raster)) => raster.pixels().is_some_and(|pixels| ready.matches(pixels)),
                _ => false,
            };
            if !current {
                log::debug!("Dropping stale alpha mask for {}", ready.layer);
                continue;
            }
            let mask = ready.mask;
            self.store.update_layer(ready.layer, |layer| {
                if let LayerKind::Raster(raster) = &mut layer.kind {
                    raster.set_alpha_mask(mask);
                }
            });
            attached += 1;
        }
        attached
    }

    // --- Selection ---

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        self.store.set_selection(ids);
        self.redraw.request();
    }

    pub fn toggle_select_layer(&mut self, id: LayerId) {
        self.store.toggle_selection(id);
        self.redraw.request();
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
        self.redraw.request();
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.tool {
            self.cancel_gesture();
            log::debug!("Tool {} -> {}", self.tool.name(), tool.name());
            self.tool = tool;
        }
    }

    // --- Handles ---

    /// Box the handles sit on: the single selected layer, or the OBB of a
    /// multi-selection.
    pub fn handle_frame(&self) -> Option<HandleFrame> {
        match self.store.selected_layers().as_slice() {
            [] => None,
            [single] => Some(HandleFrame::from_layer(single)),
            many => selection_obb(many.iter().copied()).map(|obb| HandleFrame::from_obb(&obb)),
        }
    }

    /// Handles to draw for the current selection.
    pub fn handles(&self) -> Vec<Handle> {
        self.handle_frame()
            .map(|frame| frame.handles(self.viewport.scale, self.config.rotate_handle_offset_px))
            .unwrap_or_default()
    }

    /// Marquee rectangle in screen coordinates, while one is being dragged.
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.gesture.marquee_rect()
    }

    // --- Viewport ---

    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.viewport.set_screen_size(width, height);
        self.viewport_changed();
    }

    pub fn set_content_size(&mut self, width: f64, height: f64) {
        self.viewport.set_content_size(width, height);
        self.viewport_changed();
    }

    pub fn fit_to_screen(&mut self) {
        self.viewport.fit_to_screen();
        self.viewport_changed();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
        self.viewport_changed();
    }

    /// Pan by a screen-pixel delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
        self.viewport_changed();
    }

    /// Zoom about a screen point in response to a wheel delta.
    pub fn on_wheel(&mut self, delta_y: f64, position: Point) {
        self.viewport.zoom_at(delta_y, position);
        self.viewport_changed();
    }

    fn viewport_changed(&mut self) {
        self.store.publish(StoreEvent::ViewportChanged);
        self.redraw.request();
    }

    // --- Gestures ---

    fn set_gesture(&mut self, state: GestureState) {
        log::debug!("Gesture {} -> {}", self.gesture.name(), state.name());
        self.gesture = state;
    }

    fn handle_at(&self, world: Point) -> Option<(HandleFrame, Handle)> {
        let frame = self.handle_frame()?;
        let handle = frame.detect(
            world,
            self.viewport.scale,
            self.config.handle_radius_px,
            self.config.rotate_handle_offset_px,
        )?;
        Some((frame, handle))
    }

    fn transform_targets(&self) -> Vec<Layer> {
        self.store.selected_layers().into_iter().cloned().collect()
    }

    fn begin_transform(&mut self, handle: Option<HandleKind>, frame: HandleFrame, world: Point, modifiers: Modifiers) {
        let starts = self.transform_targets();
        if starts.is_empty() {
            return;
        }
        let ctx = TransformContext::new(starts, handle, world, modifiers, frame);
        let state = match handle {
            None => GestureState::Move(ctx),
            Some(HandleKind::Rotate) => GestureState::Rotate(ctx),
            Some(_) => GestureState::Scale(ctx),
        };
        self.set_gesture(state);
    }

    pub fn on_pointer_down(&mut self, event: PointerEvent) {
        if !self.gesture.is_idle() {
            self.cancel_gesture();
        }
        if event.button == MouseButton::Middle || self.tool == ToolKind::Pan {
            self.set_gesture(GestureState::Pan { last: event.position });
            return;
        }
        if event.button != MouseButton::Left {
            return;
        }

        let world = self.viewport.screen_to_world(event.position);
        let modifiers = event.modifiers;

        if self.tool.uses_handles() {
            if let Some((frame, handle)) = self.handle_at(world) {
                self.begin_transform(Some(handle.kind), frame, world, modifiers);
                return;
            }
        }

        match pick_top_at_point(self.store.layers(), world) {
            Some(id) => {
                if modifiers.additive() {
                    self.store.toggle_selection(id);
                    self.redraw.request();
                    if !self.store.selection().contains(id) {
                        return;
                    }
                } else if !self.store.selection().contains(id) {
                    self.store.set_selection([id]);
                    self.redraw.request();
                }
                if let Some(frame) = self.handle_frame() {
                    self.begin_transform(None, frame, world, modifiers);
                }
            }
            None if self.tool.uses_marquee() => {
                self.set_gesture(GestureState::Marquee {
                    start: event.position,
                    current: event.position,
                    additive: modifiers.additive(),
                });
            }
            None => {
                if !modifiers.additive() {
                    self.clear_selection();
                }
            }
        }
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        let world = self.viewport.screen_to_world(event.position);
        let preview = match &mut self.gesture {
            GestureState::Idle => return,
            GestureState::Pan { last } => {
                let delta = event.position - *last;
                *last = event.position;
                self.viewport.pan_by(delta);
                self.viewport_changed();
                return;
            }
            GestureState::Marquee { current, .. } => {
                *current = event.position;
                self.redraw.request();
                return;
            }
            GestureState::Move(ctx) => {
                let after = move_transforms(ctx, world, &self.viewport, &self.config);
                (ctx.before(), after)
            }
            GestureState::Scale(ctx) => {
                let after = scale_transforms(ctx, world, &self.viewport, &self.config);
                (ctx.before(), after)
            }
            GestureState::Rotate(ctx) => {
                let after = rotate_transforms(ctx, world, event.modifiers, &self.viewport, &self.config);
                (ctx.before(), after)
            }
        };
        self.preview(preview.0, preview.1);
    }

    fn preview(&mut self, before: Vec<LayerTransform>, after: Vec<LayerTransform>) {
        self.history.preview(&Command::Transform { before, after }, &mut self.store);
        self.redraw.request();
    }

    pub fn on_pointer_up(&mut self, _event: PointerEvent) {
        let state = std::mem::take(&mut self.gesture);
        log::debug!("Gesture {} -> idle", state.name());
        match state {
            GestureState::Move(ctx) | GestureState::Scale(ctx) | GestureState::Rotate(ctx) => {
                let after = self.store.transforms_of(&ctx.ids());
                let command = Command::Transform { before: ctx.before(), after };
                self.history.execute(command, &mut self.store);
                self.redraw.request();
            }
            GestureState::Marquee { start, current, additive } => {
                self.finish_marquee(Rect::from_points(start, current), additive);
            }
            GestureState::Pan { .. } | GestureState::Idle => {}
        }
    }

    fn finish_marquee(&mut self, screen: Rect, additive: bool) {
        let ids = if screen.width() < MIN_MARQUEE_PX && screen.height() < MIN_MARQUEE_PX {
            Vec::new()
        } else {
            let world = Rect::from_points(
                self.viewport.screen_to_world(Point::new(screen.x0, screen.y0)),
                self.viewport.screen_to_world(Point::new(screen.x1, screen.y1)),
            );
            select_by_rect(self.store.layers(), world, self.selection_mode)
        };
        if additive {
            self.store.extend_selection(ids);
        } else {
            self.store.set_selection(ids);
        }
        self.redraw.request();
    }

    /// Abandon the gesture in progress, restoring any previewed layers.
    /// Returns false when there was nothing to cancel.
    pub fn cancel_gesture(&mut self) -> bool {
        let state = std::mem::take(&mut self.gesture);
        if state.is_idle() {
            return false;
        }
        log::debug!("Gesture {} cancelled", state.name());
        if let Some(ctx) = state.context() {
            let current = self.store.transforms_of(&ctx.ids());
            self.history.preview(
                &Command::Transform { before: current, after: ctx.before() },
                &mut self.store,
            );
        }
        self.redraw.request();
        true
    }

    /// Keyboard shortcuts: Escape cancels, Ctrl/Cmd+Z undoes (with shift,
    /// redoes), Ctrl/Cmd+Y redoes, Ctrl/Cmd+0 resets the view.
    /// Returns true if the key was handled.
    pub fn on_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let command = modifiers.ctrl || modifiers.meta;
        match key {
            "Escape" => self.cancel_gesture(),
            "z" | "Z" if command && modifiers.shift => self.redo(),
            "z" | "Z" if command => self.undo(),
            "y" | "Y" if command => self.redo(),
            "0" if command => {
                self.reset_view();
                true
            }
            _ => false,
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let done = self.history.undo(&mut self.store);
        if done {
            self.redraw.request();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let done = self.history.redo(&mut self.store);
        if done {
            self.redraw.request();
        }
        done
    }

    // --- Reset ---

    /// Restore one layer to its baseline (undoable). Locked and unknown
    /// layers are left alone.
    pub fn reset_layer(&mut self, id: LayerId) -> bool {
        self.reset_ids(&[id])
    }

    /// Restore every selected unlocked layer to its baseline as one
    /// undoable step.
    pub fn reset_selection(&mut self) -> bool {
        let ids = self.selected_ids();
        self.reset_ids(&ids)
    }

    fn reset_ids(&mut self, ids: &[LayerId]) -> bool {
        self.cancel_gesture();
        let Some(command) = reset::reset_command(&self.store, ids) else {
            return false;
        };
        log::info!("Reset {} layer(s) to baseline", ids.len());
        self.history.execute(command, &mut self.store);
        self.redraw.request();
        true
    }

    /// Exact baseline comparison. False for unknown ids.
    pub fn is_layer_at_original(&self, id: LayerId) -> bool {
        self.store.layer(id).is_some_and(reset::is_layer_at_original)
    }

    /// Run the reset self-check over the selection, or over every visible
    /// unlocked layer when nothing is selected. Leaves the session untouched.
    pub fn validate_reset(&mut self) -> Vec<ResetCheck> {
        self.cancel_gesture();
        let mut ids = self.selected_ids();
        if ids.is_empty() {
            ids = self
                .store
                .layers()
                .iter()
                .filter(|layer| layer.is_interactive())
                .map(Layer::id)
                .collect();
        }
        reset::self_check(&self.store, &ids)
    }
}

/// Impose the configured scale range and position limits on a viewport.
fn apply_viewport_bounds(viewport: &mut Viewport, config: &EditorConfig) {
    viewport.min_scale = config.viewport_min_scale;
    viewport.max_scale = config.viewport_max_scale;
    viewport.limits = config.viewport_limits;
    viewport.scale = viewport.clamp_scale(viewport.scale);
    viewport.offset = viewport.apply_limits(viewport.offset, viewport.scale);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use kurbo::Size;
    use std::cell::RefCell;
    use std::f64::consts::PI;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    /// 800x600 screen with world (0, 0) at screen (200, 200).
    fn editor() -> Editor {
        let mut editor = Editor::default();
        editor.set_screen_size(800.0, 600.0);
        editor.pan_by(Vec2::new(200.0, 200.0));
        editor
    }

    fn at(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(x, y)
    }

    fn shift() -> Modifiers {
        Modifiers { shift: true, ..Default::default() }
    }

    fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
        editor.on_pointer_down(at(from.0, from.1));
        editor.on_pointer_move(at(to.0, to.1));
        editor.on_pointer_up(at(to.0, to.1));
    }

    #[test]
    fn test_scale_gesture_commits_raster_size() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 100.0, 50.0));
        editor.set_selection([id]);
        let undo_before = editor.history().undo_len();

        // Grab the top-left corner and release it in place.
        editor.on_pointer_down(at(200.0, 200.0));
        assert!(matches!(editor.gesture(), GestureState::Scale(_)));
        editor.on_pointer_move(at(200.0, 200.0));
        editor.on_pointer_up(at(200.0, 200.0));

        let layer = editor.layer(id).unwrap();
        assert_eq!(layer.size(), Size::new(120.0, 60.0));
        assert_eq!(layer.scale, 1.0);
        assert_eq!(editor.history().undo_len(), undo_before + 1);

        assert!(editor.undo());
        assert_eq!(editor.layer(id).unwrap().size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn test_move_previews_then_commits_once() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 100.0, 50.0).at(20.0, 20.0));
        let undo_before = editor.history().undo_len();

        editor.on_pointer_down(at(250.0, 240.0));
        assert!(matches!(editor.gesture(), GestureState::Move(_)));
        editor.on_pointer_move(at(260.0, 245.0));
        editor.on_pointer_move(at(270.0, 250.0));
        assert_eq!(editor.layer(id).unwrap().position, Point::new(40.0, 30.0));
        assert_eq!(editor.history().undo_len(), undo_before);

        editor.on_pointer_up(at(270.0, 250.0));
        assert_eq!(editor.history().undo_len(), undo_before + 1);
        assert!(editor.gesture().is_idle());

        editor.undo();
        assert_eq!(editor.layer(id).unwrap().position, Point::new(20.0, 20.0));
        editor.redo();
        assert_eq!(editor.layer(id).unwrap().position, Point::new(40.0, 30.0));
    }

    #[test]
    fn test_escape_restores_start_state() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 100.0, 50.0).at(20.0, 20.0));
        let undo_before = editor.history().undo_len();

        editor.on_pointer_down(at(250.0, 240.0));
        editor.on_pointer_move(at(300.0, 300.0));
        assert_ne!(editor.layer(id).unwrap().position, Point::new(20.0, 20.0));

        assert!(editor.on_key("Escape", Modifiers::default()));
        assert_eq!(editor.layer(id).unwrap().position, Point::new(20.0, 20.0));
        assert!(editor.gesture().is_idle());
        assert_eq!(editor.history().undo_len(), undo_before);
        assert!(!editor.on_key("Escape", Modifiers::default()));
    }

    #[test]
    fn test_escape_restores_scaled_raster() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 100.0, 50.0));
        editor.set_selection([id]);
        let undo_before = editor.history().undo_len();

        editor.on_pointer_down(at(200.0, 200.0));
        assert!(matches!(editor.gesture(), GestureState::Scale(_)));
        editor.on_pointer_move(at(150.0, 150.0));
        assert_ne!(editor.layer(id).unwrap().size(), Size::new(100.0, 50.0));

        assert!(editor.on_key("Escape", Modifiers::default()));
        let layer = editor.layer(id).unwrap();
        assert_eq!(layer.size(), Size::new(100.0, 50.0));
        assert_eq!(layer.position, Point::ZERO);
        assert_eq!(layer.scale, 1.0);
        assert!(editor.gesture().is_idle());
        assert_eq!(editor.history().undo_len(), undo_before);
        assert!(editor.is_layer_at_original(id));
    }

    #[test]
    fn test_click_selection() {
        let mut editor = editor();
        let a = editor.add_layer(Layer::raster("A", 50.0, 50.0));
        let b = editor.add_layer(Layer::raster("B", 50.0, 50.0).at(100.0, 0.0));

        editor.on_pointer_down(at(225.0, 225.0));
        editor.on_pointer_up(at(225.0, 225.0));
        assert_eq!(editor.selected_ids(), vec![a]);

        editor.on_pointer_down(at(325.0, 225.0).with_modifiers(shift()));
        editor.on_pointer_up(at(325.0, 225.0));
        assert_eq!(editor.selected_ids(), vec![a, b]);
        assert_eq!(editor.store().selection().primary(), Some(b));

        // Shift-click on a selected layer removes it.
        editor.on_pointer_down(at(225.0, 225.0).with_modifiers(shift()));
        editor.on_pointer_up(at(225.0, 225.0));
        assert_eq!(editor.selected_ids(), vec![b]);

        // Click on empty canvas clears.
        editor.on_pointer_down(at(700.0, 500.0));
        editor.on_pointer_up(at(700.0, 500.0));
        assert!(editor.selected_ids().is_empty());
    }

    #[test]
    fn test_marquee_modes() {
        let mut editor = editor();
        let a = editor.add_layer(Layer::raster("A", 20.0, 20.0));
        let b = editor.add_layer(Layer::raster("B", 20.0, 20.0).at(40.0, 0.0));
        let c = editor.add_layer(Layer::raster("C", 20.0, 20.0).at(100.0, 100.0));

        // Covers A and B, grazes C's top-left corner.
        editor.set_selection_mode(SelectionMode::Contain);
        drag(&mut editor, (190.0, 190.0), (305.0, 305.0));
        let mut selected = editor.selected_ids();
        selected.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(selected, expected);

        editor.set_selection_mode(SelectionMode::Intersect);
        drag(&mut editor, (190.0, 190.0), (305.0, 305.0));
        assert_eq!(editor.selected_ids().len(), 3);
        assert!(editor.selected_ids().contains(&c));

        // An empty marquee clears; an additive one keeps the selection.
        drag(&mut editor, (600.0, 500.0), (700.0, 550.0));
        assert!(editor.selected_ids().is_empty());
        editor.set_selection([a]);
        editor.on_pointer_down(at(600.0, 500.0).with_modifiers(shift()));
        editor.on_pointer_move(at(700.0, 550.0));
        editor.on_pointer_up(at(700.0, 550.0));
        assert_eq!(editor.selected_ids(), vec![a]);
    }

    #[test]
    fn test_transparent_pixels_pass_through() {
        let mut editor = editor();
        let below = editor.add_layer(Layer::raster("Below", 100.0, 100.0));
        let mut pixels = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 0]));
        for x in 58..63 {
            for y in 58..63 {
                pixels.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let mut above = Layer::raster("Above", 100.0, 100.0);
        if let LayerKind::Raster(raster) = &mut above.kind {
            raster.set_pixels(Arc::new(pixels));
        }
        let above = editor.add_layer(above);

        editor.on_pointer_down(at(230.0, 230.0));
        editor.on_pointer_up(at(230.0, 230.0));
        assert_eq!(editor.selected_ids(), vec![below]);

        editor.on_pointer_down(at(260.5, 260.5));
        editor.on_pointer_up(at(260.5, 260.5));
        assert_eq!(editor.selected_ids(), vec![above]);
    }

    #[test]
    fn test_alpha_masks_arrive() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 8.0, 8.0));
        assert!(editor.set_layer_pixels(id, Arc::new(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])))));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut attached = 0;
        while attached == 0 && Instant::now() < deadline {
            attached += editor.poll_alpha_masks();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(attached, 1);
        match &editor.layer(id).unwrap().kind {
            LayerKind::Raster(raster) => assert!(raster.alpha_mask().is_some()),
            _ => panic!("expected a raster"),
        }
    }

    #[test]
    fn test_stale_alpha_mask_is_dropped() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Photo", 100.0, 100.0));
        let clear = Arc::new(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0])));
        let solid = Arc::new(RgbaImage::from_pixel(64, 64, Rgba([9, 9, 9, 255])));

        // The first buffer is replaced while its mask is still being built.
        assert!(editor.set_layer_pixels(id, clear));
        assert!(editor.set_layer_pixels(id, Arc::clone(&solid)));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut attached = 0;
        while attached == 0 && Instant::now() < deadline {
            attached += editor.poll_alpha_masks();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(attached, 1);
        assert_eq!(editor.poll_alpha_masks(), 0);

        match &editor.layer(id).unwrap().kind {
            LayerKind::Raster(raster) => {
                assert!(Arc::ptr_eq(raster.pixels().unwrap(), &solid));
                assert!(raster.alpha_mask().unwrap().sample(0.5, 0.5));
            }
            _ => panic!("expected a raster"),
        }
        editor.on_pointer_down(at(250.0, 250.0));
        editor.on_pointer_up(at(250.0, 250.0));
        assert_eq!(editor.selected_ids(), vec![id]);
    }

    #[test]
    fn test_group_rotate_commits_once() {
        let mut editor = editor();
        let a = editor.add_layer(Layer::raster("A", 50.0, 50.0).at(50.0, 50.0));
        let b = editor.add_layer(Layer::text("B", "Hello").at(150.0, 60.0));
        editor.set_selection([a, b]);
        let undo_before = editor.history().undo_len();

        let frame = editor.handle_frame().unwrap();
        let rotate = editor
            .handles()
            .into_iter()
            .find(|handle| handle.kind == HandleKind::Rotate)
            .unwrap();
        let start = editor.viewport().world_to_screen(rotate.position);
        editor.on_pointer_down(PointerEvent { position: start, ..at(0.0, 0.0) });
        assert!(matches!(editor.gesture(), GestureState::Rotate(_)));

        // A quarter turn around the pivot.
        let arm = rotate.position - frame.center;
        let target = frame.center + Vec2::new(-arm.y, arm.x);
        let end = editor.viewport().world_to_screen(target);
        editor.on_pointer_move(PointerEvent { position: end, ..at(0.0, 0.0) });
        editor.on_pointer_up(PointerEvent { position: end, ..at(0.0, 0.0) });

        let expected = 0.7 * PI / 2.0;
        for id in [a, b] {
            let rotation = editor.layer(id).unwrap().rotation;
            assert!((rotation - expected).abs() < 1e-9, "rotation {rotation}");
        }
        assert_eq!(editor.history().undo_len(), undo_before + 1);
    }

    #[test]
    fn test_locked_layers_cannot_be_dragged() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("Locked", 50.0, 50.0).with_locked(true));
        drag(&mut editor, (225.0, 225.0), (300.0, 300.0));
        assert_eq!(editor.layer(id).unwrap().position, Point::ZERO);
        assert!(editor.selected_ids().is_empty());
    }

    #[test]
    fn test_reset_selection_is_undoable() {
        let mut editor = editor();
        let a = editor.add_layer(Layer::raster("A", 50.0, 50.0));
        let b = editor.add_layer(Layer::text("B", "Hi").at(100.0, 0.0));
        editor.set_selection([a, b]);
        drag(&mut editor, (225.0, 225.0), (260.0, 240.0));
        assert!(!editor.is_layer_at_original(a));
        assert!(!editor.is_layer_at_original(b));

        assert!(editor.reset_selection());
        assert!(editor.is_layer_at_original(a));
        assert!(editor.is_layer_at_original(b));

        editor.undo();
        assert!(!editor.is_layer_at_original(a));
        assert!(editor.reset_layer(a));
        assert!(editor.is_layer_at_original(a));
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Move,
        Scale,
        Rotate,
    }

    fn perform(editor: &mut Editor, step: Step) {
        let frame = editor.handle_frame().unwrap();
        let (start, offset) = match step {
            Step::Move => (frame.center, Vec2::new(25.0, -15.0)),
            Step::Scale => (frame.corners[2], Vec2::new(30.0, 20.0)),
            Step::Rotate => {
                let rotate = editor
                    .handles()
                    .into_iter()
                    .find(|handle| handle.kind == HandleKind::Rotate)
                    .unwrap();
                (rotate.position, Vec2::new(60.0, 40.0))
            }
        };
        let start = editor.viewport().world_to_screen(start);
        let end = start + offset;
        editor.on_pointer_down(PointerEvent { position: start, ..at(0.0, 0.0) });
        assert!(editor.gesture().context().is_some(), "{step:?} did not start");
        editor.on_pointer_move(PointerEvent { position: end, ..at(0.0, 0.0) });
        editor.on_pointer_up(PointerEvent { position: end, ..at(0.0, 0.0) });
    }

    #[test]
    fn test_reset_after_gesture_sequences() {
        let sequences: &[&[Step]] = &[
            &[Step::Move],
            &[Step::Scale],
            &[Step::Rotate],
            &[Step::Move, Step::Scale, Step::Rotate],
            &[Step::Rotate, Step::Scale, Step::Move, Step::Scale],
        ];
        let layers = [
            Layer::raster("Photo", 100.0, 50.0).at(100.0, 100.0),
            Layer::vector("Logo", r#"<svg width="120" height="80"></svg>"#).at(300.0, 150.0),
        ];
        for sequence in sequences {
            for layer in &layers {
                let mut editor = editor();
                let id = editor.add_layer(layer.clone());
                editor.set_selection([id]);
                for &step in *sequence {
                    perform(&mut editor, step);
                }
                assert!(!editor.is_layer_at_original(id), "{sequence:?} left {} untouched", layer.name);

                assert!(editor.reset_selection());
                assert!(editor.is_layer_at_original(id), "{sequence:?} on {}", layer.name);
                editor.undo();
                editor.redo();
                assert!(editor.is_layer_at_original(id));
            }

            // The same sequence applied to an overlapping pair as a group.
            let mut editor = editor();
            let a = editor.add_layer(Layer::raster("A", 100.0, 50.0).at(100.0, 100.0));
            let b = editor.add_layer(Layer::raster("B", 100.0, 50.0).at(150.0, 120.0));
            editor.set_selection([a, b]);
            for &step in *sequence {
                perform(&mut editor, step);
            }
            assert_eq!(editor.selected_ids().len(), 2);
            assert!(editor.reset_selection());
            assert!(editor.is_layer_at_original(a), "{sequence:?} on group");
            assert!(editor.is_layer_at_original(b), "{sequence:?} on group");
        }
    }

    #[test]
    fn test_validate_reset_leaves_session_untouched() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("A", 50.0, 50.0));
        editor.add_layer(Layer::vector("V", "<svg/>").at(100.0, 100.0));
        drag(&mut editor, (225.0, 225.0), (240.0, 230.0));
        let before = editor.project();

        let checks = editor.validate_reset();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].id, id);
        assert!(checks[0].ok);
        assert_eq!(checks[0].differences, vec!["x", "y"]);
        assert_eq!(editor.project(), before);
    }

    #[test]
    fn test_pan_and_wheel_publish_viewport_changes() {
        let mut editor = editor();
        let events = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&events);
        editor.subscribe(move |event| {
            if *event == StoreEvent::ViewportChanged {
                *sink.borrow_mut() += 1;
            }
        });

        editor.set_tool(ToolKind::Pan);
        drag(&mut editor, (100.0, 100.0), (130.0, 90.0));
        assert_eq!(editor.viewport().offset, Vec2::new(230.0, 190.0));

        let focus = Point::new(400.0, 300.0);
        let world = editor.viewport().screen_to_world(focus);
        editor.on_wheel(-100.0, focus);
        assert!((editor.viewport().scale - 1.2).abs() < 1e-12);
        let after = editor.viewport().world_to_screen(world);
        assert!((after.x - focus.x).abs() < 1e-9 && (after.y - focus.y).abs() < 1e-9);

        assert!(editor.on_key("0", Modifiers { ctrl: true, ..Default::default() }));
        assert_eq!(editor.viewport().scale, 1.0);
        assert_eq!(*events.borrow(), 3);
    }

    #[test]
    fn test_project_round_trip() {
        let mut editor = editor();
        let id = editor.add_layer(Layer::raster("A", 50.0, 50.0));
        editor.set_selection([id]);
        drag(&mut editor, (225.0, 225.0), (235.0, 235.0));

        let json = editor.project().to_json().unwrap();
        let restored = Editor::from_project(Project::from_json(&json).unwrap(), EditorConfig::default());
        assert_eq!(restored.project(), editor.project());
        assert_eq!(restored.selected_ids(), vec![id]);
        assert!(!restored.history().can_undo());
    }

    #[test]
    fn test_project_viewport_takes_configured_bounds() {
        let mut project = Project::new(Vec::new());
        project.viewport.scale = 50.0;
        project.viewport.max_scale = 100.0;
        project.viewport.offset = Vec2::new(100.0, 100.0);
        project.viewport.set_screen_size(800.0, 600.0);
        project.viewport.set_content_size(1000.0, 1000.0);
        let config = EditorConfig { viewport_limits: true, ..EditorConfig::default() };

        let editor = Editor::from_project(project, config);
        let viewport = editor.viewport();
        assert_eq!(viewport.max_scale, 20.0);
        assert_eq!(viewport.scale, 20.0);
        assert!(viewport.limits);
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert_eq!(viewport.screen_size, Size::new(800.0, 600.0));
    }

    #[test]
    fn test_remove_layer_undo() {
        let mut editor = editor();
        let a = editor.add_layer(Layer::raster("A", 10.0, 10.0));
        let b = editor.add_layer(Layer::raster("B", 10.0, 10.0));
        assert!(editor.remove_layer(a));
        assert!(!editor.remove_layer(a));
        editor.undo();
        let order: Vec<LayerId> = editor.layers().iter().map(Layer::id).collect();
        assert_eq!(order, vec![a, b]);
    }
}
