//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the world-to-screen mapping of the design surface.
///
/// Screen coordinates are `world * scale + offset`. The scale is clamped to
/// `[min_scale, max_scale]`; when `limits` is set, the offset is clamped so
/// the content rectangle cannot leave the visible area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom factor.
    pub scale: f64,
    /// Minimum allowed zoom factor.
    pub min_scale: f64,
    /// Maximum allowed zoom factor.
    pub max_scale: f64,
    /// Screen position of the world origin.
    pub offset: Vec2,
    /// Size of the visible area in screen pixels.
    pub screen_size: Size,
    /// Size of the content in world units.
    pub content_size: Size,
    /// Clamp the offset so the content stays on screen.
    #[serde(default)]
    pub limits: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            min_scale: 0.05,
            max_scale: 20.0,
            offset: Vec2::ZERO,
            screen_size: Size::ZERO,
            content_size: Size::ZERO,
            limits: false,
        }
    }
}

impl Viewport {
    /// Create a new viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with the given scale limits.
    pub fn with_scale_limits(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// The affine transform mapping world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// The affine transform mapping screen coordinates to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Convert a length in screen pixels to world units.
    pub fn screen_to_world_distance(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }

    /// Clamp a zoom factor into `[min_scale, max_scale]`.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.max(self.min_scale).min(self.max_scale)
    }

    /// Apply the position limits for a given scale.
    ///
    /// The offset is kept within `[screen - content * scale, 0]` on each axis.
    /// An axis where the scaled content is smaller than the screen is
    /// centred instead. Content without a size is not limited.
    pub fn apply_limits(&self, offset: Vec2, scale: f64) -> Vec2 {
        if !self.limits || self.content_size.width <= 0.0 || self.content_size.height <= 0.0 {
            return offset;
        }
        Vec2::new(
            limit_axis(offset.x, self.screen_size.width, self.content_size.width * scale),
            limit_axis(offset.y, self.screen_size.height, self.content_size.height * scale),
        )
    }

    /// Set the offset, honouring the position limits.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.offset = self.apply_limits(Vec2::new(x, y), self.scale);
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.set_position(self.offset.x + delta.x, self.offset.y + delta.y);
    }

    /// Set the zoom factor.
    ///
    /// With a focal screen point, the world point under that pixel stays
    /// under it after the zoom.
    pub fn set_scale(&mut self, scale: f64, focus: Option<Point>) {
        let new_scale = self.clamp_scale(scale);
        match focus {
            Some(focus) => {
                let local_x = (focus.x - self.offset.x) / self.scale;
                let local_y = (focus.y - self.offset.y) / self.scale;
                let offset = Vec2::new(focus.x - local_x * new_scale, focus.y - local_y * new_scale);
                self.offset = self.apply_limits(offset, new_scale);
                self.scale = new_scale;
            }
            None => self.scale = new_scale,
        }
    }

    /// Zoom in response to a wheel delta, keeping `focus` fixed on screen.
    pub fn zoom_at(&mut self, delta_y: f64, focus: Point) {
        let factor = 1.2_f64.powf(-delta_y / 100.0);
        self.set_scale(self.scale * factor, Some(focus));
    }

    /// Scale and centre the content to fit the screen.
    ///
    /// Does nothing until both the screen and the content have a size.
    pub fn fit_to_screen(&mut self) {
        let Size { width: sw, height: sh } = self.screen_size;
        let Size { width: cw, height: ch } = self.content_size;
        if sw <= 0.0 || sh <= 0.0 || cw <= 0.0 || ch <= 0.0 {
            return;
        }
        let scale = self.clamp_scale((sw / cw).min(sh / ch));
        let offset = Vec2::new((sw - cw * scale) / 2.0, (sh - ch * scale) / 2.0);
        self.offset = self.apply_limits(offset, scale);
        self.scale = scale;
    }

    /// Reset to 100% zoom at the origin.
    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.offset = Vec2::ZERO;
    }

    /// Set the visible area size in screen pixels.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_size = Size::new(width, height);
    }

    /// Set the content size in world units.
    pub fn set_content_size(&mut self, width: f64, height: f64) {
        self.content_size = Size::new(width, height);
    }

    /// Whether the visible area has a usable size.
    pub fn has_screen(&self) -> bool {
        self.screen_size.width > 0.0 && self.screen_size.height > 0.0
    }
}

fn limit_axis(offset: f64, screen: f64, content: f64) -> f64 {
    let min = screen - content;
    if min > 0.0 {
        min / 2.0
    } else {
        offset.clamp(min, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_scale() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(50.0, 100.0);
        viewport.scale = 2.0;
        let world = viewport.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        for (offset, scale) in [
            (Vec2::new(30.0, -20.0), 1.5),
            (Vec2::new(-412.5, 77.0), 0.07),
            (Vec2::new(0.0, 0.0), 13.0),
        ] {
            let mut viewport = Viewport::new();
            viewport.offset = offset;
            viewport.scale = scale;

            let original = Point::new(123.0, 456.0);
            let back = viewport.screen_to_world(viewport.world_to_screen(original));
            assert!((back.x - original.x).abs() < 1e-9);
            assert!((back.y - original.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_affine_matches_point_mapping() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(12.0, 34.0);
        viewport.scale = 3.0;
        let p = Point::new(5.0, -7.0);
        let a = viewport.transform() * p;
        let b = viewport.world_to_screen(p);
        assert!((a.x - b.x).abs() < 1e-12);
        assert!((a.y - b.y).abs() < 1e-12);
        let back = viewport.inverse_transform() * a;
        assert!((back.x - p.x).abs() < 1e-12);
    }

    #[test]
    fn test_scale_clamp() {
        let mut viewport = Viewport::new();
        viewport.set_scale(0.0001, None);
        assert!((viewport.scale - viewport.min_scale).abs() < f64::EPSILON);
        viewport.set_scale(1000.0, None);
        assert!((viewport.scale - viewport.max_scale).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_scale_keeps_focus_fixed() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(40.0, 10.0);
        let focus = Point::new(200.0, 150.0);
        let before = viewport.screen_to_world(focus);
        viewport.set_scale(2.5, Some(focus));
        let after = viewport.screen_to_world(focus);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_factor() {
        let mut viewport = Viewport::new();
        viewport.zoom_at(-100.0, Point::ZERO);
        assert!((viewport.scale - 1.2).abs() < 1e-12);
        viewport.zoom_at(100.0, Point::ZERO);
        assert!((viewport.scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pan_with_limits() {
        let mut viewport = Viewport::new();
        viewport.limits = true;
        viewport.set_screen_size(800.0, 600.0);
        viewport.set_content_size(1000.0, 1000.0);

        viewport.pan_by(Vec2::new(50.0, 50.0));
        assert_eq!(viewport.offset, Vec2::ZERO);

        viewport.pan_by(Vec2::new(-500.0, -500.0));
        assert!((viewport.offset.x - (-200.0)).abs() < f64::EPSILON);
        assert!((viewport.offset.y - (-400.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_limits_with_small_content() {
        let mut viewport = Viewport::new();
        viewport.limits = true;
        viewport.set_screen_size(800.0, 600.0);
        viewport.set_content_size(100.0, 100.0);
        viewport.set_position(300.0, -20.0);
        assert_eq!(viewport.offset, Vec2::new(350.0, 250.0));
    }

    #[test]
    fn test_fit_centers_with_limits() {
        let mut viewport = Viewport::new();
        viewport.limits = true;
        viewport.set_screen_size(800.0, 600.0);
        viewport.set_content_size(400.0, 200.0);
        viewport.fit_to_screen();
        assert!((viewport.scale - 2.0).abs() < f64::EPSILON);
        assert!(viewport.offset.x.abs() < f64::EPSILON);
        assert!((viewport.offset.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_scale_with_focus_honours_limits() {
        let mut viewport = Viewport::with_scale_limits(0.5, 4.0);
        viewport.limits = true;
        viewport.set_screen_size(800.0, 600.0);
        viewport.set_content_size(1000.0, 1000.0);

        viewport.set_scale(2.0, Some(Point::new(800.0, 600.0)));
        assert!((viewport.scale - 2.0).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(-800.0, -600.0));

        // Zooming out about the origin would leave a gap on the right; x is
        // pulled back to the screen edge.
        viewport.set_scale(1.0, Some(Point::ZERO));
        assert_eq!(viewport.offset, Vec2::new(-200.0, -300.0));

        // The requested scale clamps to the maximum before limits apply.
        viewport.set_scale(10.0, Some(Point::ZERO));
        assert!((viewport.scale - 4.0).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(-800.0, -1200.0));

        // Content scaled below the screen size is centred.
        viewport.set_scale(0.5, Some(Point::new(400.0, 300.0)));
        assert!((viewport.scale - 0.5).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(150.0, 50.0));
    }

    #[test]
    fn test_fit_to_screen() {
        let mut viewport = Viewport::new();
        viewport.set_screen_size(800.0, 600.0);
        viewport.set_content_size(400.0, 200.0);
        viewport.fit_to_screen();
        assert!((viewport.scale - 2.0).abs() < f64::EPSILON);
        assert!((viewport.offset.x - 0.0).abs() < f64::EPSILON);
        assert!((viewport.offset.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_screen_without_sizes_is_noop() {
        let mut viewport = Viewport::new();
        viewport.scale = 3.0;
        viewport.fit_to_screen();
        assert!((viewport.scale - 3.0).abs() < f64::EPSILON);
    }
}
