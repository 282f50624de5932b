//! Surface scattering for the three material kinds.

use std::f64::consts::PI;

use crate::{gen_f64, Ray};
use penumbra_core::MaterialKind;
use penumbra_math::DVec3;
use rand::RngCore;

/// Index of refraction outside every sphere.
pub const AIR_IOR: f64 = 1.0;
/// Index of refraction inside refractive spheres.
pub const GLASS_IOR: f64 = 1.5;

/// Outcome of scattering a ray off a surface.
#[derive(Debug, Clone, Copy)]
pub struct Scatter {
    /// The continuation ray
    pub ray: Ray,
    /// Factor applied to path throughput on top of the albedo.
    ///
    /// 1 for deterministic events, the inverse branch probability times the
    /// Fresnel term when a reflect/transmit choice was sampled.
    pub weight: f64,
}

impl Scatter {
    fn new(ray: Ray, weight: f64) -> Self {
        Self { ray, weight }
    }
}

/// Scatter `ray_in` at hit point `p` with outward unit normal `normal`.
pub fn scatter(
    kind: MaterialKind,
    ray_in: &Ray,
    p: DVec3,
    normal: DVec3,
    rng: &mut dyn RngCore,
) -> Scatter {
    match kind {
        MaterialKind::Diffuse => {
            let oriented = face_forward(normal, ray_in.direction());
            Scatter::new(Ray::new(p, sample_cosine_hemisphere(oriented, rng)), 1.0)
        }
        MaterialKind::Specular => {
            Scatter::new(Ray::new(p, reflect(ray_in.direction(), normal)), 1.0)
        }
        MaterialKind::Refractive => scatter_dielectric(ray_in, p, normal, rng),
    }
}

/// Ideal dielectric: Fresnel-weighted choice between reflection and refraction.
fn scatter_dielectric(ray_in: &Ray, p: DVec3, normal: DVec3, rng: &mut dyn RngCore) -> Scatter {
    let d = ray_in.direction();
    let oriented = face_forward(normal, d);
    let reflected = Ray::new(p, reflect(d, normal));

    // Ray from outside going in?
    let into = normal.dot(oriented) > 0.0;
    let nnt = if into { AIR_IOR / GLASS_IOR } else { GLASS_IOR / AIR_IOR };
    let ddn = d.dot(oriented);
    let cos2t = 1.0 - nnt * nnt * (1.0 - ddn * ddn);

    // Total internal reflection
    if cos2t < 0.0 {
        return Scatter::new(reflected, 1.0);
    }

    let sign = if into { 1.0 } else { -1.0 };
    let tdir = (d * nnt - normal * (sign * (ddn * nnt + cos2t.sqrt()))).normalize_or_zero();

    let re = schlick(if into { -ddn } else { tdir.dot(normal) });
    let tr = 1.0 - re;
    let p_reflect = 0.25 + 0.5 * re;

    if gen_f64(rng) < p_reflect {
        Scatter::new(reflected, re / p_reflect)
    } else {
        Scatter::new(Ray::new(p, tdir), tr / (1.0 - p_reflect))
    }
}

/// Schlick's approximation of Fresnel reflectance for the air/glass pair.
#[inline]
fn schlick(cosine: f64) -> f64 {
    let a = GLASS_IOR - AIR_IOR;
    let b = GLASS_IOR + AIR_IOR;
    let r0 = a * a / (b * b);
    let c = 1.0 - cosine;
    r0 + (1.0 - r0) * c.powi(5)
}

/// Flip `normal` so it faces against `direction`.
#[inline]
pub fn face_forward(normal: DVec3, direction: DVec3) -> DVec3 {
    if normal.dot(direction) < 0.0 {
        normal
    } else {
        -normal
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: DVec3, n: DVec3) -> DVec3 {
    v - n * 2.0 * n.dot(v)
}

/// Orthonormal pair `(u, v)` completing `w` to a right-handed basis.
fn orthonormal_basis(w: DVec3) -> (DVec3, DVec3) {
    let helper = if w.x.abs() > 0.1 { DVec3::Y } else { DVec3::X };
    let u = helper.cross(w).normalize_or_zero();
    let v = w.cross(u);
    (u, v)
}

/// Cosine-weighted direction on the hemisphere around `w`.
fn sample_cosine_hemisphere(w: DVec3, rng: &mut dyn RngCore) -> DVec3 {
    let r1 = 2.0 * PI * gen_f64(rng);
    let r2 = gen_f64(rng);
    let r2s = r2.sqrt();
    let (u, v) = orthonormal_basis(w);

    (u * r1.cos() * r2s + v * r1.sin() * r2s + w * (1.0 - r2).sqrt()).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// An rng whose `gen::<f64>()` is always 0.
    fn always_low() -> StepRng {
        StepRng::new(0, 0)
    }

    /// An rng whose `gen::<f64>()` is always just below 1.
    fn always_high() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_reflect() {
        let v = DVec3::new(1.0, -1.0, 0.0);
        assert_eq!(reflect(v, DVec3::Y), DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_face_forward() {
        assert_eq!(face_forward(DVec3::Y, DVec3::NEG_Y), DVec3::Y);
        assert_eq!(face_forward(DVec3::Y, DVec3::Y), DVec3::NEG_Y);
    }

    #[test]
    fn test_orthonormal_basis() {
        for w in [DVec3::X, DVec3::Y, DVec3::NEG_Z, DVec3::new(0.3, -0.4, 0.5).normalize()] {
            let (u, v) = orthonormal_basis(w);
            assert!((u.length() - 1.0).abs() < 1e-12);
            assert!((v.length() - 1.0).abs() < 1e-12);
            assert!(u.dot(w).abs() < 1e-12);
            assert!(v.dot(w).abs() < 1e-12);
            assert!(u.dot(v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_diffuse_scatters_into_oriented_hemisphere() {
        let mut rng = StdRng::seed_from_u64(7);
        let incoming = Ray::new(DVec3::new(0.0, 1.0, 0.0), DVec3::NEG_Y);

        for _ in 0..1000 {
            // Outward normal +Y, ray arrives from above
            let s = scatter(MaterialKind::Diffuse, &incoming, DVec3::ZERO, DVec3::Y, &mut rng);
            assert!(s.ray.direction().y >= 0.0);
            assert!((s.ray.direction().length() - 1.0).abs() < 1e-9);
            assert_eq!(s.weight, 1.0);

            // Same surface hit from inside: hemisphere flips
            let s = scatter(MaterialKind::Diffuse, &incoming, DVec3::ZERO, DVec3::NEG_Y, &mut rng);
            assert!(s.ray.direction().y >= 0.0);
        }
    }

    #[test]
    fn test_diffuse_is_cosine_weighted() {
        // E[cos theta] = 2/3 for a cosine-weighted hemisphere
        let mut rng = StdRng::seed_from_u64(11);
        let incoming = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        let n = 20_000;
        let mean: f64 = (0..n)
            .map(|_| {
                let s = scatter(MaterialKind::Diffuse, &incoming, DVec3::ZERO, DVec3::Z, &mut rng);
                s.ray.direction().z
            })
            .sum::<f64>()
            / n as f64;
        assert!((mean - 2.0 / 3.0).abs() < 0.01, "mean cos = {mean}");
    }

    #[test]
    fn test_specular_mirrors() {
        let mut rng = always_low();
        let d = DVec3::new(1.0, -1.0, 0.0).normalize();
        let s = scatter(MaterialKind::Specular, &Ray::new(DVec3::ZERO, d), DVec3::ONE, DVec3::Y, &mut rng);
        assert_eq!(s.ray.origin(), DVec3::ONE);
        assert!((s.ray.direction() - DVec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-12);
        assert_eq!(s.weight, 1.0);
    }

    #[test]
    fn test_refractive_normal_incidence() {
        let incoming = Ray::new(DVec3::new(0.0, 5.0, 0.0), DVec3::NEG_Y);
        let r0 = 0.04;
        let p = 0.25 + 0.5 * r0;

        // Low sample: reflect
        let s = scatter(MaterialKind::Refractive, &incoming, DVec3::ZERO, DVec3::Y, &mut always_low());
        assert!((s.ray.direction() - DVec3::Y).length() < 1e-12);
        assert!((s.weight - r0 / p).abs() < 1e-12);

        // High sample: transmit straight through
        let s = scatter(MaterialKind::Refractive, &incoming, DVec3::ZERO, DVec3::Y, &mut always_high());
        assert!((s.ray.direction() - DVec3::NEG_Y).length() < 1e-12);
        assert!((s.weight - (1.0 - r0) / (1.0 - p)).abs() < 1e-12);

        // Branch weights are unbiased: P * wr + (1 - P) * wt == 1
        assert!((p * (r0 / p) + (1.0 - p) * ((1.0 - r0) / (1.0 - p)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_refractive_bends_toward_normal_on_entry() {
        let d = DVec3::new(1.0, -1.0, 0.0).normalize();
        let incoming = Ray::new(DVec3::ZERO, d);
        let s = scatter(MaterialKind::Refractive, &incoming, DVec3::ZERO, DVec3::Y, &mut always_high());
        let t = s.ray.direction();

        // Snell: sin(theta_t) = sin(45deg) / 1.5
        let sin_t = t.x / t.length();
        assert!((sin_t - (0.5f64.sqrt() / GLASS_IOR)).abs() < 1e-9);
        assert!(t.y < 0.0);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving the glass at 60 degrees from the normal exceeds the critical angle
        let d = DVec3::new(60f64.to_radians().sin(), 60f64.to_radians().cos(), 0.0);
        let incoming = Ray::new(DVec3::ZERO, d);

        for mut rng in [always_low(), always_high()] {
            let s = scatter(MaterialKind::Refractive, &incoming, DVec3::ZERO, DVec3::Y, &mut rng);
            assert_eq!(s.weight, 1.0);
            assert!((s.ray.direction() - DVec3::new(d.x, -d.y, 0.0)).length() < 1e-12);
        }
    }
}
