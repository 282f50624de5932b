//! Monte Carlo radiance estimation.
//!
//! Paths are traced with an explicit loop carrying accumulated radiance,
//! path throughput and bounce depth, so stack usage does not grow with path
//! length. Paths end when they escape the scene or lose at Russian roulette.

use crate::{gen_f64, material, Color, Ray, RenderConfig};
use penumbra_core::Scene;
use rand::RngCore;

/// Bounce depth after which Russian roulette may terminate a path.
pub const ROULETTE_DEPTH: u32 = 5;

/// Estimate the radiance arriving along `ray`.
///
/// The ray direction must be unit length. The background is black. The
/// estimate is unbiased: surviving paths after [`ROULETTE_DEPTH`] bounces are
/// reweighted by the inverse survival probability. `config.max_depth`, when
/// set, truncates paths (and so biases the estimate low).
pub fn radiance(ray: &Ray, scene: &Scene, config: &RenderConfig, rng: &mut dyn RngCore) -> Color {
    let mut ray = *ray;
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut depth = 0u32;

    loop {
        let Some(hit) = scene.intersect(&ray) else {
            return radiance;
        };
        let Some(sphere) = scene.get(hit.id) else {
            return radiance;
        };

        let p = ray.at(hit.distance);
        let normal = sphere.normal_at(p);

        radiance += throughput * sphere.emission();

        depth += 1;
        if config.max_depth.is_some_and(|max| depth >= max) {
            return radiance;
        }

        let mut f = sphere.albedo();
        if depth > ROULETTE_DEPTH {
            let survive = f.max_element();
            if gen_f64(rng) >= survive {
                return radiance;
            }
            f /= survive;
        }
        throughput *= f;

        let scatter = material::scatter(sphere.material(), &ray, p, normal, rng);
        throughput *= scatter.weight;
        ray = scatter.ray;
    }
}
