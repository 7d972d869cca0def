//! LayerDesk Core Library
//!
//! Platform-agnostic layer editing: viewport mapping, oriented-box geometry,
//! selection, transform gestures with undo, and baseline reset.

pub mod alpha;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod gesture;
pub mod group;
pub mod handles;
pub mod history;
pub mod input;
pub mod layers;
pub mod project;
pub mod redraw;
pub mod reset;
pub mod selection;
pub mod snap;
pub mod store;
pub mod tools;
pub mod viewport;

pub use kurbo;

pub use alpha::{AlphaMask, AlphaMaskResult, AlphaMaskWorker, build_alpha_mask};
pub use config::EditorConfig;
pub use editor::Editor;
pub use geometry::{Obb, compute_obb, polygon_aabb_contained, polygon_aabb_intersect, selection_obb, world_corners};
pub use gesture::{GestureState, TransformContext};
pub use group::{apply_group_transform, group_pivot};
pub use handles::{Handle, HandleFrame, HandleKind, anchor_for_handle, detect_handle};
pub use history::{Command, History};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use layers::{Baseline, BaselineSize, Layer, LayerId, LayerKind, LayerTransform, Raster, Text, Vector};
pub use project::{Project, ProjectError, ProjectResult};
pub use redraw::RedrawThrottle;
pub use reset::{ResetCheck, is_layer_at_original, reset_layer};
pub use selection::{Selection, SelectionMode, pick_top_at_point, select_by_rect};
pub use snap::{SnapResult, snap_angle, snap_point};
pub use store::{LayerStore, StoreEvent, SubscriptionId};
pub use tools::ToolKind;
pub use viewport::Viewport;
