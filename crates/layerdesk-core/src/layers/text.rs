//! Text layer content.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font size used for bounds approximation.
pub const TEXT_FONT_SIZE: f64 = 16.0;
/// Fixed line height.
pub const TEXT_LINE_HEIGHT: f64 = 20.0;
/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.52;

/// A single line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    /// Width reported by a renderer that measured the glyphs.
    #[serde(skip)]
    measured_width: Option<f64>,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            measured_width: None,
        }
    }

    /// Record the rendered width. Non-finite or negative values are ignored.
    pub fn set_measured_width(&mut self, width: f64) {
        if width.is_finite() && width >= 0.0 {
            self.measured_width = Some(width);
        }
    }

    pub fn measured_width(&self) -> Option<f64> {
        self.measured_width
    }

    fn approximate_width(&self) -> f64 {
        self.content.chars().count() as f64 * TEXT_FONT_SIZE * CHAR_WIDTH_FACTOR
    }

    /// Bounding box: the measured (or approximated) width rounded up, by one line.
    pub fn size(&self) -> Size {
        let width = self.measured_width.unwrap_or_else(|| self.approximate_width());
        Size::new(width.ceil(), TEXT_LINE_HEIGHT)
    }
}
