//! Pinhole camera for ray generation.

use crate::Ray;
use penumbra_math::DVec3;

/// Tangent of half the vertical field of view of the default camera.
pub const DEFAULT_FOV_SCALE: f64 = 0.5135;

/// Distance camera rays are advanced before tracing, so they start inside the
/// scene instead of behind near geometry such as the front wall.
pub const DEFAULT_PUSH_FORWARD: f64 = 140.0;

/// Pinhole camera looking into the scene.
///
/// Image coordinates passed to [`Camera::get_ray`] are continuous pixel
/// positions with `y` counted from the bottom of the image.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    position: DVec3,
    direction: DVec3,

    // Lens settings
    fov_scale: f64,
    push_forward: f64,

    // Cached image-plane basis (set by initialize())
    cx: DVec3,
    cy: DVec3,
}

impl Camera {
    /// Create a camera framing the Cornell box at 512x512.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 512,
            image_height: 512,
            position: DVec3::new(50.0, 52.0, 295.6),
            direction: DVec3::new(0.0, -0.042612, -1.0).normalize(),
            fov_scale: DEFAULT_FOV_SCALE,
            push_forward: DEFAULT_PUSH_FORWARD,
            cx: DVec3::ZERO,
            cy: DVec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self.initialize();
        self
    }

    /// Recompute the image-plane basis from the current settings.
    fn initialize(&mut self) {
        let aspect = self.image_width as f64 / self.image_height.max(1) as f64;
        let right = self.direction.cross(DVec3::Y).normalize_or_zero();
        self.cx = right * (aspect * self.fov_scale);
        self.cy = self.cx.cross(self.direction).normalize_or_zero() * self.fov_scale;
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Generate the ray through continuous image position `(px, py)`.
    ///
    /// The returned direction is unit length.
    pub fn get_ray(&self, px: f64, py: f64) -> Ray {
        let d = self.cx * (px / self.image_width as f64 - 0.5)
            + self.cy * (py / self.image_height as f64 - 0.5)
            + self.direction;

        Ray::new(self.position + d * self.push_forward, d.normalize_or_zero())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
