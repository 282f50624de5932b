//! Sphere primitive and its material kind.

use penumbra_math::{Color, DVec3, Interval, Ray};
use serde::{Deserialize, Serialize};

/// Minimum accepted hit distance, suppresses self-intersection at a ray's origin.
pub const EPSILON: f64 = 1e-4;

/// How a surface scatters light. Exactly one per sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    /// Ideal Lambertian reflector
    Diffuse,
    /// Perfect mirror
    Specular,
    /// Glass with index of refraction 1.5 in air
    Refractive,
}

/// A sphere with emission, albedo and a material kind.
///
/// Spheres are immutable once built. `Sphere::new` does not validate its
/// input; `Scene::new` rejects spheres with a non-positive or non-finite
/// radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    radius: f64,
    center: DVec3,
    emission: Color,
    albedo: Color,
    material: MaterialKind,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(
        radius: f64,
        center: DVec3,
        emission: Color,
        albedo: Color,
        material: MaterialKind,
    ) -> Self {
        Self {
            radius,
            center,
            emission,
            albedo,
            material,
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Light emitted by the surface.
    #[inline]
    pub fn emission(&self) -> Color {
        self.emission
    }

    /// Fraction of incoming light reflected per channel.
    #[inline]
    pub fn albedo(&self) -> Color {
        self.albedo
    }

    #[inline]
    pub fn material(&self) -> MaterialKind {
        self.material
    }

    /// True if the sphere emits any light.
    pub fn is_emissive(&self) -> bool {
        self.emission.max_element() > 0.0
    }

    /// Outward unit normal at a point on the surface.
    #[inline]
    pub fn normal_at(&self, p: DVec3) -> DVec3 {
        (p - self.center).normalize_or_zero()
    }

    /// Distance along `ray` to the nearest surface crossing inside `ray_t`.
    ///
    /// Solves `t^2 + 2t(o-c).d + |o-c|^2 - r^2 = 0`, which assumes a unit
    /// length direction. The near root is preferred, the far root is used
    /// when the origin is inside the sphere.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<f64> {
        let op = self.center - ray.origin();
        let b = op.dot(ray.direction());
        let det = b * b - op.length_squared() + self.radius * self.radius;
        if det < 0.0 {
            return None;
        }

        let sqrtd = det.sqrt();
        let near = b - sqrtd;
        if ray_t.surrounds(near) {
            return Some(near);
        }
        let far = b + sqrtd;
        if ray_t.surrounds(far) {
            return Some(far);
        }
        None
    }

    /// Distance to the nearest crossing beyond `EPSILON`, or `None` on a miss.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        self.hit(ray, Interval::new(EPSILON, f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey(radius: f64, center: DVec3) -> Sphere {
        Sphere::new(radius, center, Color::ZERO, Color::splat(0.5), MaterialKind::Diffuse)
    }

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = grey(2.0, DVec3::ZERO);

        for d in [3.0, 10.0, 250.0] {
            let ray = Ray::new(DVec3::new(-d, 0.0, 0.0), DVec3::X);
            let t = sphere.intersect(&ray).expect("ray aimed at the sphere must hit");
            assert!((t - (d - 2.0)).abs() < 1e-9, "d={d} t={t}");
        }
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = grey(2.0, DVec3::ZERO);
        let ray = Ray::new(DVec3::ZERO, DVec3::Y);
        let t = sphere.intersect(&ray).unwrap();
        assert!((t - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = grey(1.0, DVec3::new(0.0, 0.0, -5.0));

        // Pointing away
        let ray = Ray::new(DVec3::ZERO, DVec3::Z);
        assert_eq!(sphere.intersect(&ray), None);

        // Passing beside it (negative discriminant)
        let ray = Ray::new(DVec3::new(3.0, 0.0, 0.0), DVec3::NEG_Z);
        assert_eq!(sphere.intersect(&ray), None);
    }

    #[test]
    fn test_sphere_ignores_hit_at_origin() {
        // A ray leaving the surface must not re-hit it at t ~ 0
        let sphere = grey(1.0, DVec3::ZERO);
        let ray = Ray::new(DVec3::new(1.0, 0.0, 0.0), DVec3::X);
        assert_eq!(sphere.intersect(&ray), None);
    }

    #[test]
    fn test_hit_respects_upper_bound() {
        let sphere = grey(1.0, DVec3::new(10.0, 0.0, 0.0));
        let ray = Ray::new(DVec3::ZERO, DVec3::X);
        assert_eq!(sphere.hit(&ray, Interval::new(EPSILON, 5.0)), None);
        assert!(sphere.hit(&ray, Interval::new(EPSILON, 9.5)).is_some());
    }

    #[test]
    fn test_normal_at() {
        let sphere = grey(2.0, DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(sphere.normal_at(DVec3::new(3.0, 0.0, 0.0)), DVec3::X);
        assert_eq!(sphere.normal_at(sphere.center()), DVec3::ZERO);
    }

    #[test]
    fn test_material_kind_json_names() {
        let kind: MaterialKind = serde_json::from_str("\"refractive\"").unwrap();
        assert_eq!(kind, MaterialKind::Refractive);
        assert_eq!(serde_json::to_string(&MaterialKind::Diffuse).unwrap(), "\"diffuse\"");
    }
}
