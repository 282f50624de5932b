//! Scene description for Penumbra.
//!
//! A scene is a fixed, ordered list of spheres. It is built once at start-up,
//! never mutated afterwards, and shared read-only by every render worker.
//! A sphere's position in the list is its id.

use std::path::Path;
use std::sync::Arc;

use penumbra_math::{Color, DVec3, Interval, Ray};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sphere::{MaterialKind, Sphere, EPSILON};

/// Hit distances at or beyond this value count as a miss.
pub const FAR: f64 = 1e20;

/// Errors that can occur while building or loading a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sphere {index} has invalid radius {radius} (must be positive and finite)")]
    InvalidRadius { index: usize, radius: f64 },

    #[error("Sphere {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },
}

/// Nearest intersection between a ray and the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the ray
    pub distance: f64,
    /// Index of the sphere that was hit
    pub id: usize,
}

/// On-disk layout of a scene file.
#[derive(Serialize, Deserialize)]
struct SceneFile {
    spheres: Vec<Sphere>,
}

/// An immutable collection of spheres.
///
/// Cloning is cheap; clones share the same sphere storage.
#[derive(Debug, Clone)]
pub struct Scene {
    spheres: Arc<[Sphere]>,
}

impl Scene {
    /// Build a scene, validating every sphere.
    pub fn new(spheres: Vec<Sphere>) -> Result<Self, SceneError> {
        for (index, sphere) in spheres.iter().enumerate() {
            validate_sphere(index, sphere)?;
        }
        if !spheres.iter().any(Sphere::is_emissive) {
            log::warn!("Scene has no emissive spheres, the image will be black");
        }
        Ok(Self {
            spheres: spheres.into(),
        })
    }

    /// Parse a scene from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let file: SceneFile = serde_json::from_str(json)?;
        Self::new(file.spheres)
    }

    /// Load a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        log::info!("Loaded {} spheres from {}", scene.len(), path.display());
        Ok(scene)
    }

    /// Serialize the scene to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SceneError> {
        let file = SceneFile {
            spheres: self.spheres.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// The classic closed Cornell box: six huge walls, a mirror ball, a glass
    /// ball and a ceiling light.
    pub fn cornell_box() -> Self {
        use MaterialKind::*;

        let wall = 1e5;
        let spheres = vec![
            // Left
            Sphere::new(wall, DVec3::new(1e5 + 1.0, 40.8, 81.6), Color::ZERO, Color::new(0.75, 0.25, 0.25), Diffuse),
            // Right
            Sphere::new(wall, DVec3::new(-1e5 + 99.0, 40.8, 81.6), Color::ZERO, Color::new(0.25, 0.25, 0.75), Diffuse),
            // Back
            Sphere::new(wall, DVec3::new(50.0, 40.8, 1e5), Color::ZERO, Color::splat(0.75), Diffuse),
            // Front
            Sphere::new(wall, DVec3::new(50.0, 40.8, -1e5 + 170.0), Color::ZERO, Color::ZERO, Diffuse),
            // Bottom
            Sphere::new(wall, DVec3::new(50.0, 1e5, 81.6), Color::ZERO, Color::splat(0.75), Diffuse),
            // Top
            Sphere::new(wall, DVec3::new(50.0, -1e5 + 81.6, 81.6), Color::ZERO, Color::splat(0.75), Diffuse),
            // Mirror
            Sphere::new(16.5, DVec3::new(27.0, 16.5, 47.0), Color::ZERO, Color::splat(0.999), Specular),
            // Glass
            Sphere::new(16.5, DVec3::new(73.0, 16.5, 78.0), Color::ZERO, Color::splat(0.999), Refractive),
            // Light
            Sphere::new(600.0, DVec3::new(50.0, 681.6 - 0.27, 81.6), Color::splat(12.0), Color::ZERO, Diffuse),
        ];

        Self {
            spheres: spheres.into(),
        }
    }

    /// All spheres in id order.
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Sphere with the given id.
    pub fn get(&self, id: usize) -> Option<&Sphere> {
        self.spheres.get(id)
    }

    /// Number of spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Find the nearest sphere hit by `ray`.
    ///
    /// Scans every sphere in id order and keeps a hit only when it is strictly
    /// closer than the best so far, so equal distances resolve to the lower id.
    /// The ray direction must be unit length.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut closest: Option<Hit> = None;
        let mut ray_t = Interval::new(EPSILON, FAR);

        for (id, sphere) in self.spheres.iter().enumerate() {
            if let Some(distance) = sphere.hit(ray, ray_t) {
                ray_t = ray_t.with_max(distance);
                closest = Some(Hit { distance, id });
            }
        }

        closest
    }
}

fn validate_sphere(index: usize, sphere: &Sphere) -> Result<(), SceneError> {
    let radius = sphere.radius();
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SceneError::InvalidRadius { index, radius });
    }
    let fields = [
        ("center", sphere.center()),
        ("emission", sphere.emission()),
        ("albedo", sphere.albedo()),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(SceneError::NonFinite { index, field });
        }
    }
    Ok(())
}
