//! Layer definitions for the design surface.

mod raster;
mod text;
mod vector;

pub use raster::Raster;
pub(crate) use raster::texel as raster_texel;
pub use text::{Text, TEXT_FONT_SIZE, TEXT_LINE_HEIGHT};
pub use vector::{Vector, DEFAULT_VECTOR_SIZE};

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// Kind-specific layer content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Raster(Raster),
    Vector(Vector),
    Text(Text),
}

impl LayerKind {
    /// Short name of the kind, as used in reports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Raster(_) => "raster",
            LayerKind::Vector(_) => "vector",
            LayerKind::Text(_) => "text",
        }
    }

    /// Unscaled local size of the content.
    pub fn size(&self) -> Size {
        match self {
            LayerKind::Raster(raster) => raster.size(),
            LayerKind::Vector(vector) => vector.intrinsic_size(),
            LayerKind::Text(text) => text.size(),
        }
    }
}

/// How a baseline records the layer's size.
///
/// Rasters encode size as explicit pixel dimensions (scale is implicitly 1);
/// vectors and text encode it as a scale factor over their content size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "lowercase")]
pub enum BaselineSize {
    Raster { width: f64, height: f64 },
    Scaled { scale: f64 },
}

/// A layer's creation-time transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub size: BaselineSize,
}

/// Transform fields of a layer, used for previews, commits and undo.
///
/// `size` is only meaningful for raster layers and is ignored otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerTransform {
    pub id: LayerId,
    pub position: Point,
    pub rotation: f64,
    pub scale: f64,
    pub size: Option<Size>,
}

/// A layer on the design surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    #[serde(flatten)]
    pub kind: LayerKind,
    /// World position of the untransformed top-left corner.
    pub position: Point,
    /// Rotation in radians.
    pub rotation: f64,
    /// Uniform scale factor.
    pub scale: f64,
    pub visible: bool,
    pub locked: bool,
    pub selected: bool,
    baseline: Baseline,
}

impl Layer {
    fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        let mut layer = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            position: Point::ZERO,
            rotation: 0.0,
            scale: 1.0,
            visible: true,
            locked: false,
            selected: false,
            baseline: Baseline {
                x: 0.0,
                y: 0.0,
                rotation: 0.0,
                size: BaselineSize::Scaled { scale: 1.0 },
            },
        };
        layer.capture_baseline();
        layer
    }

    /// Create a raster layer with explicit pixel dimensions.
    pub fn raster(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(name, LayerKind::Raster(Raster::new(width, height)))
    }

    /// Create a vector layer from SVG markup.
    pub fn vector(name: impl Into<String>, svg: impl Into<String>) -> Self {
        Self::new(name, LayerKind::Vector(Vector::new(svg)))
    }

    /// Create a text layer.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, LayerKind::Text(Text::new(content)))
    }

    /// Builder: use a specific id.
    pub fn with_id(mut self, id: LayerId) -> Self {
        self.id = id;
        self
    }

    /// Builder: place the top-left corner.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self.capture_baseline();
        self
    }

    /// Builder: set the rotation in radians.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self.capture_baseline();
        self
    }

    /// Builder: set the scale. Rasters fold it into their pixel dimensions.
    pub fn with_scale(mut self, scale: f64) -> Self {
        match &mut self.kind {
            LayerKind::Raster(raster) => {
                raster.width *= scale;
                raster.height *= scale;
                self.scale = 1.0;
            }
            _ => self.scale = scale,
        }
        self.capture_baseline();
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn capture_baseline(&mut self) {
        let size = match &self.kind {
            LayerKind::Raster(raster) => BaselineSize::Raster {
                width: raster.width,
                height: raster.height,
            },
            _ => BaselineSize::Scaled { scale: self.scale },
        };
        self.baseline = Baseline {
            x: self.position.x,
            y: self.position.y,
            rotation: self.rotation,
            size,
        };
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn is_raster(&self) -> bool {
        matches!(self.kind, LayerKind::Raster(_))
    }

    /// Visible and unlocked.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    /// Unscaled local size.
    pub fn size(&self) -> Size {
        self.kind.size()
    }

    /// Local-to-world transform: `translate(position) * rotate(rotation) * scale(scale)`.
    pub fn world_transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
    }

    /// Map a world point into the layer's local (unrotated, unscaled) frame.
    pub fn local_point(&self, world: Point) -> Point {
        let d = world - self.position;
        let (sin, cos) = (-self.rotation).sin_cos();
        let rotated = Vec2::new(cos * d.x - sin * d.y, sin * d.x + cos * d.y);
        let scale = if self.scale == 0.0 { 1.0 } else { self.scale };
        (rotated / scale).to_point()
    }

    /// Whether a world point falls inside the layer's bounds.
    pub fn contains_point(&self, world: Point) -> bool {
        let local = self.local_point(world);
        let size = self.size();
        local.x >= 0.0 && local.y >= 0.0 && local.x <= size.width && local.y <= size.height
    }

    /// Snapshot the transform fields.
    pub fn transform(&self) -> LayerTransform {
        LayerTransform {
            id: self.id,
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            size: match &self.kind {
                LayerKind::Raster(raster) => Some(raster.size()),
                _ => None,
            },
        }
    }

    /// Write transform fields back. Raster sizes are only updated when present.
    pub fn apply_transform(&mut self, transform: &LayerTransform) {
        self.position = transform.position;
        self.rotation = transform.rotation;
        self.scale = transform.scale;
        if let (LayerKind::Raster(raster), Some(size)) = (&mut self.kind, transform.size) {
            raster.width = size.width;
            raster.height = size.height;
        }
    }

    /// The transform that puts this layer back on its baseline.
    pub fn baseline_transform(&self) -> LayerTransform {
        let (scale, size) = match self.baseline.size {
            BaselineSize::Raster { width, height } => (1.0, Some(Size::new(width, height))),
            BaselineSize::Scaled { scale } => (scale, None),
        };
        LayerTransform {
            id: self.id,
            position: Point::new(self.baseline.x, self.baseline.y),
            rotation: self.baseline.rotation,
            scale,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_captures_baseline() {
        let layer = Layer::text("Title", "Hello").at(10.0, 20.0).with_rotation(0.5).with_scale(2.0);
        let baseline = layer.baseline();
        assert_eq!(baseline.x, 10.0);
        assert_eq!(baseline.y, 20.0);
        assert_eq!(baseline.rotation, 0.5);
        assert_eq!(baseline.size, BaselineSize::Scaled { scale: 2.0 });
    }

    #[test]
    fn test_raster_scale_folds_into_size() {
        let layer = Layer::raster("Photo", 100.0, 50.0).with_scale(2.0);
        assert_eq!(layer.scale, 1.0);
        assert_eq!(layer.size(), Size::new(200.0, 100.0));
        assert_eq!(
            layer.baseline().size,
            BaselineSize::Raster { width: 200.0, height: 100.0 }
        );
    }

    #[test]
    fn test_local_point_inverts_world_transform() {
        let layer = Layer::raster("Photo", 100.0, 50.0)
            .at(30.0, -10.0)
            .with_rotation(0.8);
        let layer = Layer { scale: 1.5, ..layer };
        let local = Point::new(12.0, 34.0);
        let world = layer.world_transform() * local;
        let back = layer.local_point(world);
        assert!((back.x - local.x).abs() < 1e-9);
        assert!((back.y - local.y).abs() < 1e-9);
    }

    #[test]
    fn test_contains_point() {
        let layer = Layer::raster("Photo", 100.0, 50.0).at(10.0, 10.0);
        assert!(layer.contains_point(Point::new(50.0, 30.0)));
        assert!(!layer.contains_point(Point::new(5.0, 30.0)));
        assert!(!layer.contains_point(Point::new(50.0, 61.0)));
    }

    #[test]
    fn test_apply_transform_ignores_size_for_vectors() {
        let mut layer = Layer::vector("Logo", r#"<svg width="40" height="20"></svg>"#);
        let mut transform = layer.transform();
        transform.scale = 3.0;
        transform.size = Some(Size::new(1.0, 1.0));
        layer.apply_transform(&transform);
        assert_eq!(layer.scale, 3.0);
        assert_eq!(layer.size(), Size::new(40.0, 20.0));
    }

    #[test]
    fn test_serde_roundtrip() {
        let layer = Layer::raster("Photo", 64.0, 32.0).at(1.0, 2.0);
        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains(r#""type":"raster""#));
        let back: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
    }
}
