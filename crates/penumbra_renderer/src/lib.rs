//! Penumbra renderer - CPU path tracing
//!
//! A Monte Carlo path tracer for scenes of spheres. The image is split into
//! row bands, each band is rendered by one worker of a fixed cohort, and the
//! coordinator gathers the bands into the final image.
//!
//! ```no_run
//! use penumbra_core::Scene;
//! use penumbra_renderer::{render_distributed, save_image, RenderConfig};
//!
//! let config = RenderConfig::default().with_resolution(256, 256).with_samples(4);
//! let image = render_distributed(&Scene::cornell_box(), &config, 4)?;
//! save_image(&image, "image.ppm")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod buffer;
mod camera;
mod cohort;
mod material;
mod output;
mod partition;
mod radiance;
mod renderer;

pub use buffer::PixelBuffer;
pub use camera::{Camera, DEFAULT_FOV_SCALE, DEFAULT_PUSH_FORWARD};
pub use cohort::{assemble, Cohort, CohortError, Communicator, COORDINATOR};
pub use material::{face_forward, reflect, scatter, Scatter, AIR_IOR, GLASS_IOR};
pub use output::{color_to_rgb, encode_rgb, linear_to_gamma, save_image, to_byte, write_ppm, OutputError, GAMMA};
pub use partition::{partition_rows, RowBand};
pub use radiance::{radiance, ROULETTE_DEPTH};
pub use renderer::{
    clamp_01, clamp_color, render_band, render_distributed, render_pixel, render_row, row_seed,
    RenderConfig, RenderError,
};

/// Re-export common math types from penumbra_math
pub use penumbra_math::{Color, DVec3, Interval, Ray};

use rand::{Rng, RngCore};

/// Uniform sample in [0, 1).
#[inline]
pub(crate) fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen()
}
