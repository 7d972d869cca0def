//! Undoable commands and the undo/redo history.

use crate::config::MAX_UNDO_HISTORY;
use crate::layers::{Layer, LayerId, LayerTransform};
use crate::store::LayerStore;
use kurbo::Point;

/// A reversible edit to the layer store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a layer on top.
    AddLayer { layer: Layer },
    /// Remove a layer; undo puts it back at `index`.
    RemoveLayer { layer: Layer, index: usize },
    Move { id: LayerId, from: Point, to: Point },
    Rotate { id: LayerId, from: f64, to: f64 },
    Scale { id: LayerId, from: f64, to: f64 },
    /// Whole-transform snapshots of any number of layers.
    Transform {
        before: Vec<LayerTransform>,
        after: Vec<LayerTransform>,
    },
}

impl Command {
    /// Snapshot a removal of `id`, if it exists.
    pub fn remove_layer(store: &LayerStore, id: LayerId) -> Option<Self> {
        let index = store.index_of(id)?;
        let layer = store.layer(id)?.clone();
        Some(Command::RemoveLayer { layer, index })
    }

    /// Apply the forward direction.
    pub fn apply(&self, store: &mut LayerStore) {
        match self {
            Command::AddLayer { layer } => {
                if store.layer(layer.id()).is_none() {
                    store.add_layer(layer.clone());
                }
            }
            Command::RemoveLayer { layer, .. } => {
                store.remove_layer(layer.id());
            }
            Command::Move { id, to, .. } => {
                store.update_layer(*id, |layer| layer.position = *to);
            }
            Command::Rotate { id, to, .. } => {
                store.update_layer(*id, |layer| layer.rotation = *to);
            }
            Command::Scale { id, to, .. } => {
                store.update_layer(*id, |layer| layer.scale = *to);
            }
            Command::Transform { after, .. } => store.apply_transforms(after),
        }
    }

    /// Apply the reverse direction.
    pub fn revert(&self, store: &mut LayerStore) {
        match self {
            Command::AddLayer { layer } => {
                store.remove_layer(layer.id());
            }
            Command::RemoveLayer { layer, index } => {
                if store.layer(layer.id()).is_none() {
                    store.insert_layer(*index, layer.clone());
                }
            }
            Command::Move { id, from, .. } => {
                store.update_layer(*id, |layer| layer.position = *from);
            }
            Command::Rotate { id, from, .. } => {
                store.update_layer(*id, |layer| layer.rotation = *from);
            }
            Command::Scale { id, from, .. } => {
                store.update_layer(*id, |layer| layer.scale = *from);
            }
            Command::Transform { before, .. } => store.apply_transforms(before),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AddLayer { .. } => "add layer",
            Command::RemoveLayer { .. } => "remove layer",
            Command::Move { .. } => "move",
            Command::Rotate { .. } => "rotate",
            Command::Scale { .. } => "scale",
            Command::Transform { .. } => "transform",
        }
    }
}

/// Undo and redo stacks.
///
/// [`preview`](Self::preview) applies a command without recording it;
/// [`execute`](Self::execute) applies and records it, clearing the redo stack.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undo entries (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Apply without recording.
    pub fn preview(&self, command: &Command, store: &mut LayerStore) {
        log::trace!("Preview {}", command.name());
        command.apply(store);
    }

    /// Apply and record.
    pub fn execute(&mut self, command: Command, store: &mut LayerStore) {
        command.apply(store);
        self.record(command);
    }

    /// Record a command whose effect is already in the store.
    pub fn record(&mut self, command: Command) {
        log::debug!("Commit {}", command.name());
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last command.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, store: &mut LayerStore) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            return false;
        };
        command.revert(store);
        self.redo_stack.push(command);
        true
    }

    /// Redo the last undone command.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, store: &mut LayerStore) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        command.apply(store);
        self.undo_stack.push(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
