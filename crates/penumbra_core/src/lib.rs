//! Penumbra Core - scene model for the path tracer.
//!
//! This crate provides:
//!
//! - **Primitives**: `Sphere` with emission, albedo and a `MaterialKind`
//! - **Scene**: an immutable, ordered sphere list with nearest-hit queries
//! - **Scene files**: JSON loading and saving via serde
//!
//! # Example
//!
//! ```
//! use penumbra_core::Scene;
//! use penumbra_math::{DVec3, Ray};
//!
//! let scene = Scene::cornell_box();
//! let ray = Ray::new(DVec3::new(50.0, 40.0, 150.0), DVec3::NEG_Z);
//! let hit = scene.intersect(&ray).expect("the box is closed");
//! assert_eq!(hit.id, 2); // back wall
//! ```

pub mod scene;
pub mod sphere;

// Re-export commonly used types
pub use scene::{Hit, Scene, SceneError, FAR};
pub use sphere::{MaterialKind, Sphere, EPSILON};
