//! Editing tools.

use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Click/marquee selection plus handle transforms.
    #[default]
    Select,
    /// Body drag only.
    Move,
    /// Same gestures as `Select`.
    Transform,
    /// Drag the viewport.
    Pan,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Move => "move",
            ToolKind::Transform => "transform",
            ToolKind::Pan => "pan",
        }
    }

    /// Whether handles are hit-tested on pointer-down.
    pub fn uses_handles(&self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::Transform)
    }

    /// Whether a press on empty canvas starts a marquee.
    pub fn uses_marquee(&self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::Transform)
    }
}
