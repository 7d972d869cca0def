//! Downsampled opacity masks for raster hit testing.
//!
//! Masks are built off the event thread by [`AlphaMaskWorker`] and delivered
//! through [`AlphaMaskWorker::poll`]. Hit testing never waits for them.

use crate::layers::LayerId;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(target_arch = "wasm32"))]
use std::thread;

/// Default longest edge of a mask.
pub const DEFAULT_MASK_SIZE: u32 = 256;

/// One byte per texel: 1 where the source had any opacity, else 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl AlphaMask {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// Sample at normalized coordinates `(u, v)` in `[0, 1]`.
    pub fn sample(&self, u: f64, v: f64) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let x = crate::layers::raster_texel(u, self.width);
        let y = crate::layers::raster_texel(v, self.height);
        let index = (y as usize) * (self.width as usize) + x as usize;
        self.data.get(index).is_some_and(|&texel| texel != 0)
    }
}

/// Mask dimensions for a source image, keeping its aspect ratio with the
/// longest edge at `max_size`.
fn mask_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    let (w, h) = if aspect >= 1.0 {
        (max_size as f64, (max_size as f64 / aspect).round())
    } else {
        ((max_size as f64 * aspect).round(), max_size as f64)
    };
    ((w as u32).max(1), (h as u32).max(1))
}

/// Build a mask from decoded pixels.
pub fn build_alpha_mask(pixels: &RgbaImage, max_size: u32) -> AlphaMask {
    let (src_w, src_h) = pixels.dimensions();
    if src_w == 0 || src_h == 0 || max_size == 0 {
        return AlphaMask::new(0, 0, Vec::new());
    }
    let (w, h) = mask_dimensions(src_w, src_h, max_size);
    let resized = imageops::resize(pixels, w, h, FilterType::Triangle);
    let data = resized.pixels().map(|p| u8::from(p[3] > 0)).collect();
    AlphaMask::new(w, h, data)
}

struct AlphaJob {
    layer: LayerId,
    pixels: Arc<RgbaImage>,
}

impl AlphaJob {
    fn build(self, max_size: u32) -> AlphaMaskResult {
        let mask = build_alpha_mask(&self.pixels, max_size);
        AlphaMaskResult {
            layer: self.layer,
            source: self.pixels,
            mask: Arc::new(mask),
        }
    }
}

/// A mask ready to be attached to its layer.
#[derive(Debug, Clone)]
pub struct AlphaMaskResult {
    pub layer: LayerId,
    /// The pixel buffer the mask was built from. A layer whose pixels have
    /// since been replaced must not take the mask.
    pub source: Arc<RgbaImage>,
    pub mask: Arc<AlphaMask>,
}

impl AlphaMaskResult {
    /// Whether this mask was built from `pixels`.
    pub fn matches(&self, pixels: &Arc<RgbaImage>) -> bool {
        Arc::ptr_eq(&self.source, pixels)
    }
}

/// Builds alpha masks on a background thread.
///
/// On wasm32, and if the thread cannot be started, masks are built inline
/// and still delivered through [`poll`](Self::poll). Dropping the worker
/// never waits for queued jobs: the thread finishes the job in hand and
/// exits.
pub struct AlphaMaskWorker {
    max_size: u32,
    jobs: Option<Sender<AlphaJob>>,
    results_tx: Sender<AlphaMaskResult>,
    results: Receiver<AlphaMaskResult>,
    #[cfg(not(target_arch = "wasm32"))]
    cancelled: Arc<AtomicBool>,
}

impl std::fmt::Debug for AlphaMaskWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaMaskWorker")
            .field("max_size", &self.max_size)
            .field("threaded", &self.jobs.is_some())
            .finish()
    }
}

impl Default for AlphaMaskWorker {
    fn default() -> Self {
        Self::spawn(DEFAULT_MASK_SIZE)
    }
}

impl AlphaMaskWorker {
    /// Start the worker.
    pub fn spawn(max_size: u32) -> Self {
        let (results_tx, results) = channel();
        let mut worker = Self {
            max_size,
            jobs: None,
            results_tx,
            results,
            #[cfg(not(target_arch = "wasm32"))]
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        #[cfg(not(target_arch = "wasm32"))]
        worker.start_thread();
        worker
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_thread(&mut self) {
        let (job_tx, job_rx) = channel::<AlphaJob>();
        let results_tx = self.results_tx.clone();
        let cancelled = Arc::clone(&self.cancelled);
        let max_size = self.max_size;

        let spawned = thread::Builder::new()
            .name("alpha-mask".into())
            .spawn(move || {
                for job in job_rx {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    let ready = job.build(max_size);
                    log::debug!(
                        "Alpha mask ready for {} ({}x{})",
                        ready.layer,
                        ready.mask.width,
                        ready.mask.height
                    );
                    if results_tx.send(ready).is_err() {
                        break;
                    }
                }
                log::debug!("Alpha mask worker exiting");
            });

        // The thread is detached; it exits on its own once cancelled or
        // once the job sender is gone.
        match spawned {
            Ok(_) => self.jobs = Some(job_tx),
            Err(e) => log::warn!("Failed to start alpha mask worker, building inline: {}", e),
        }
    }

    /// Queue a mask build for a layer's pixels.
    pub fn request(&self, layer: LayerId, pixels: Arc<RgbaImage>) {
        let job = AlphaJob { layer, pixels };
        let job = match &self.jobs {
            Some(jobs) => match jobs.send(job) {
                Ok(()) => return,
                Err(e) => {
                    log::warn!("Alpha mask worker is gone, building inline");
                    e.0
                }
            },
            None => job,
        };
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.results_tx.send(job.build(self.max_size));
    }

    /// Drain every mask that has arrived since the last poll.
    pub fn poll(&self) -> Vec<AlphaMaskResult> {
        self.results.try_iter().collect()
    }

    /// Block until `count` results have arrived or `timeout` passes
    /// without a new one.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<AlphaMaskResult> {
        let mut ready = Vec::with_capacity(count);
        while ready.len() < count {
            match self.results.recv_timeout(timeout) {
                Ok(result) => ready.push(result),
                Err(_) => break,
            }
        }
        ready
    }
}

impl Drop for AlphaMaskWorker {
    fn drop(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        self.cancelled.store(true, Ordering::Relaxed);
        self.jobs = None;
    }
}
