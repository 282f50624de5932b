// Re-export glam for convenience
pub use glam::*;

// Penumbra math types
mod interval;
mod ray;
pub use interval::Interval;
pub use ray::Ray;

/// RGB color, stored in the same three-component type as points and directions.
pub type Color = DVec3;
