//! Layer store with change notification.
//!
//! The store is the single owner of layer state. Every mutation goes through
//! it and is published to subscribers as a [`StoreEvent`].

use crate::layers::{Layer, LayerId, LayerTransform};
use crate::selection::Selection;

/// A change published by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    LayerAdded(LayerId),
    LayerRemoved(LayerId),
    LayerUpdated(LayerId),
    SelectionChanged,
    ViewportChanged,
}

/// Handle returned by [`LayerStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// Z-ordered layers (back to front) and the current selection.
#[derive(Default)]
pub struct LayerStore {
    layers: Vec<Layer>,
    selection: Selection,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl std::fmt::Debug for LayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStore")
            .field("layers", &self.layers)
            .field("selection", &self.selection)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every subsequent change.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(other, _)| *other != id);
        self.subscribers.len() != before
    }

    pub(crate) fn publish(&mut self, event: StoreEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }

    /// Add a layer on top.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let index = self.layers.len();
        self.insert_layer(index, layer)
    }

    /// Insert a layer at a z-index, clamped to the stack size.
    pub fn insert_layer(&mut self, index: usize, mut layer: Layer) -> LayerId {
        let id = layer.id();
        layer.selected = self.selection.contains(id);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.publish(StoreEvent::LayerAdded(id));
        id
    }

    /// Remove a layer, returning its z-index and contents.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<(usize, Layer)> {
        let index = self.index_of(id)?;
        let layer = self.layers.remove(index);
        self.publish(StoreEvent::LayerRemoved(id));
        if self.selection.contains(id) {
            self.selection.remove(id);
            self.publish(StoreEvent::SelectionChanged);
        }
        Some((index, layer))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    /// Layers back to front.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers front to back.
    pub fn layers_top_down(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev()
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Mutate one layer. Returns false for an unknown id.
    pub fn update_layer(&mut self, id: LayerId, f: impl FnOnce(&mut Layer)) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id() == id) else {
            return false;
        };
        f(layer);
        self.publish(StoreEvent::LayerUpdated(id));
        true
    }

    /// Write transform snapshots back. Unknown ids are skipped.
    pub fn apply_transforms(&mut self, transforms: &[LayerTransform]) {
        for transform in transforms {
            self.update_layer(transform.id, |layer| layer.apply_transform(transform));
        }
    }

    /// Transform snapshots of the given layers, in the given order.
    pub fn transforms_of(&self, ids: &[LayerId]) -> Vec<LayerTransform> {
        ids.iter()
            .filter_map(|&id| self.layer(id).map(Layer::transform))
            .collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected layers that are visible and unlocked, back to front.
    pub fn selected_layers(&self) -> Vec<&Layer> {
        self.layers
            .iter()
            .filter(|layer| self.selection.contains(layer.id()) && layer.is_interactive())
            .collect()
    }

    /// Replace the selection. Unknown and locked ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        let ids: Vec<LayerId> = ids.into_iter().filter(|&id| self.is_selectable(id)).collect();
        let mut selection = Selection::new();
        selection.set(ids);
        self.replace_selection(selection);
    }

    /// Add to the selection. Unknown and locked ids are dropped.
    pub fn extend_selection(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        let ids: Vec<LayerId> = ids.into_iter().filter(|&id| self.is_selectable(id)).collect();
        let mut selection = self.selection.clone();
        selection.extend(ids);
        self.replace_selection(selection);
    }

    /// Toggle one layer in or out of the selection.
    pub fn toggle_selection(&mut self, id: LayerId) {
        if !self.selection.contains(id) && !self.is_selectable(id) {
            return;
        }
        let mut selection = self.selection.clone();
        selection.toggle(id);
        self.replace_selection(selection);
    }

    pub fn clear_selection(&mut self) {
        self.replace_selection(Selection::new());
    }

    fn is_selectable(&self, id: LayerId) -> bool {
        self.layer(id).is_some_and(|layer| !layer.locked)
    }

    fn replace_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }
        self.selection = selection;
        for layer in &mut self.layers {
            layer.selected = self.selection.contains(layer.id());
        }
        self.publish(StoreEvent::SelectionChanged);
    }

    /// Replace every layer and the selection at once, as when loading.
    pub fn reset_contents(&mut self, layers: Vec<Layer>, selected: Option<LayerId>) {
        self.clear_selection();
        let removed: Vec<LayerId> = self.layers.drain(..).map(|layer| layer.id()).collect();
        for id in removed {
            self.publish(StoreEvent::LayerRemoved(id));
        }
        for layer in layers {
            self.add_layer(layer);
        }
        self.set_selection(selected);
    }
}
