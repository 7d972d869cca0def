//! Raster layer content.

use crate::alpha::AlphaMask;
use image::RgbaImage;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A bitmap image with explicit display dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    /// Display width in world units.
    pub width: f64,
    /// Display height in world units.
    pub height: f64,
    /// Decoded pixels, when the importer provided them.
    #[serde(skip)]
    pixels: Option<Arc<RgbaImage>>,
    /// Downsampled opacity mask built in the background.
    #[serde(skip)]
    alpha_mask: Option<Arc<AlphaMask>>,
}

impl Raster {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pixels: None,
            alpha_mask: None,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn pixels(&self) -> Option<&Arc<RgbaImage>> {
        self.pixels.as_ref()
    }

    /// Attach decoded pixels. Any previously built mask is dropped.
    pub fn set_pixels(&mut self, pixels: Arc<RgbaImage>) {
        self.pixels = Some(pixels);
        self.alpha_mask = None;
    }

    pub fn alpha_mask(&self) -> Option<&Arc<AlphaMask>> {
        self.alpha_mask.as_ref()
    }

    pub fn set_alpha_mask(&mut self, mask: Arc<AlphaMask>) {
        self.alpha_mask = Some(mask);
    }

    /// Whether the content is opaque at a point in the layer's local frame.
    ///
    /// Uses the alpha mask when available, then the pixel buffer. A raster
    /// with neither is treated as fully opaque.
    pub fn is_opaque_at(&self, local: Point) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        let u = local.x / self.width;
        let v = local.y / self.height;

        if let Some(mask) = &self.alpha_mask {
            return mask.sample(u, v);
        }
        match &self.pixels {
            Some(pixels) => {
                let (w, h) = pixels.dimensions();
                if w == 0 || h == 0 {
                    return false;
                }
                let px = texel(u, w);
                let py = texel(v, h);
                pixels.get_pixel(px, py)[3] > 0
            }
            None => true,
        }
    }
}

/// Map a normalized coordinate to a texel index in `[0, len - 1]`.
pub(crate) fn texel(t: f64, len: u32) -> u32 {
    let max = len.saturating_sub(1);
    let index = (t * len as f64).floor();
    if index <= 0.0 {
        0
    } else if index >= max as f64 {
        max
    } else {
        index as u32
    }
}
