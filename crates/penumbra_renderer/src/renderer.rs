//! Per-pixel sampling and distributed rendering.
//!
//! Implements:
//! - 2x2 sub-pixel stratification with tent-filtered jitter
//! - Deterministic per-scanline random streams
//! - Band rendering (rows in parallel with rayon)
//! - The full partition / render / gather pipeline over a worker cohort

use crate::{
    gen_f64, partition_rows, radiance, Camera, Cohort, CohortError, Color, PixelBuffer, RowBand,
};
use penumbra_core::Scene;
use penumbra_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

/// Errors returned by the render entry points.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Cohort(#[from] CohortError),
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Path samples per sub-pixel (each pixel has 4 sub-pixels)
    pub samples_per_subpixel: u32,
    /// Optional hard limit on bounces; `None` leaves termination to Russian roulette
    pub max_depth: Option<u32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            samples_per_subpixel: 1,
            max_depth: None,
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set samples per sub-pixel.
    pub fn with_samples(mut self, samples_per_subpixel: u32) -> Self {
        self.samples_per_subpixel = samples_per_subpixel;
        self
    }

    /// Set the optional bounce limit.
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Total path samples per pixel.
    pub fn samples_per_pixel(&self) -> u64 {
        4 * self.samples_per_subpixel as u64
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.samples_per_subpixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples per sub-pixel must be positive".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(RenderError::InvalidConfig(
                "max depth must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Camera for this resolution.
    pub fn camera(&self) -> Camera {
        Camera::new().with_resolution(self.width, self.height)
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f64) -> f64 {
    Interval::UNIT.clamp(x)
}

/// Clamp each channel of a color to [0, 1].
#[inline]
pub fn clamp_color(c: Color) -> Color {
    Color::new(clamp_01(c.x), clamp_01(c.y), clamp_01(c.z))
}

/// Offset in (-1, 1) drawn from a triangle distribution peaked at 0.
#[inline]
fn tent(rng: &mut dyn RngCore) -> f64 {
    let r = 2.0 * gen_f64(rng);
    if r < 1.0 {
        r.sqrt() - 1.0
    } else {
        1.0 - (2.0 - r).sqrt()
    }
}

/// Seed of the random stream for camera row `y`.
///
/// `y³`, wrapping for rows past 2,642,245.
#[inline]
pub fn row_seed(y: u32) -> u64 {
    (y as u64).wrapping_pow(3)
}

/// Render one pixel at column `x`, camera row `y` (counted from the bottom).
///
/// Each of the 2x2 sub-pixels averages `samples_per_subpixel` jittered path
/// estimates; the sub-pixel means are clamped to [0, 1] and averaged with
/// equal weight, so every channel of the result is in [0, 1].
pub fn render_pixel(
    camera: &Camera,
    scene: &Scene,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let inv_samples = 1.0 / config.samples_per_subpixel as f64;
    let mut pixel = Color::ZERO;

    for sy in 0..2 {
        for sx in 0..2 {
            let mut sub = Color::ZERO;
            for _ in 0..config.samples_per_subpixel {
                let dx = tent(rng);
                let dy = tent(rng);
                let px = (sx as f64 + 0.5 + dx) / 2.0 + x as f64;
                let py = (sy as f64 + 0.5 + dy) / 2.0 + y as f64;
                let ray = camera.get_ray(px, py);
                sub += radiance(&ray, scene, config, rng) * inv_samples;
            }
            pixel += clamp_color(sub) * 0.25;
        }
    }

    pixel
}

/// Render output row `row` into `out` (one color per column).
///
/// Output row 0 is the top of the image, which is camera row `height - 1`.
pub fn render_row(camera: &Camera, scene: &Scene, row: u32, config: &RenderConfig, out: &mut [Color]) {
    let y = camera.image_height - 1 - row;
    let mut rng = StdRng::seed_from_u64(row_seed(y));

    for (x, pixel) in out.iter_mut().enumerate() {
        *pixel = render_pixel(camera, scene, x as u32, y, config, &mut rng);
    }
}

/// Render the rows of `band` into a fresh buffer.
///
/// `camera` must have the resolution of `config`. Rows are rendered in
/// parallel; each row draws from its own seeded stream, so the result does
/// not depend on scheduling or on how the image was split into bands.
pub fn render_band(camera: &Camera, scene: &Scene, config: &RenderConfig, band: RowBand) -> PixelBuffer {
    debug_assert_eq!(
        (camera.image_width, camera.image_height),
        (config.width, config.height),
        "camera resolution differs from the render config"
    );
    debug_assert!(band.end <= config.height, "band {band:?} is past the image height");
    let width = config.width;
    let mut buffer = PixelBuffer::new(width, band);
    if buffer.pixels().is_empty() {
        return buffer;
    }

    buffer
        .pixels_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(i, out)| render_row(camera, scene, band.start + i as u32, config, out));

    buffer
}

/// Render the full image on a cohort of `workers` and return the gathered result.
///
/// Every rank renders its own row band without communicating, then all
/// ranks meet at a single gather on the coordinator. The image is the same
/// for any worker count.
pub fn render_distributed(scene: &Scene, config: &RenderConfig, workers: usize) -> Result<PixelBuffer, RenderError> {
    config.validate()?;
    let cohort = Cohort::new(workers)?;
    let camera = config.camera();

    log::info!(
        "Rendering {}x{} @ {} spp on {} workers",
        config.width,
        config.height,
        config.samples_per_pixel(),
        cohort.size()
    );
    for (rank, band) in partition_rows(config.height, cohort.size()).iter().enumerate() {
        log::debug!("Worker {} assigned rows {}..{}", rank, band.start, band.end);
    }

    let image = cohort.run(|comm| {
        let band = RowBand::for_rank(config.height, comm.size(), comm.rank());
        let start = std::time::Instant::now();
        let buffer = render_band(&camera, scene, config, band);
        log::debug!(
            "Worker {} rendered {} rows in {:?}",
            comm.rank(),
            band.len(),
            start.elapsed()
        );
        comm.gather(buffer)
    })?;

    Ok(image)
}
