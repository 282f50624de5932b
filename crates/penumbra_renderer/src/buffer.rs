//! Pixel buffers for worker bands and the assembled image.

use crate::{Color, RowBand};

/// Row-major radiance values for a band of image rows.
///
/// Each worker renders into a buffer covering its own band. The coordinator's
/// gathered image is a buffer whose band spans the full height.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    band: RowBand,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Create a buffer for `band` filled with black.
    pub fn new(width: u32, band: RowBand) -> Self {
        let len = width as usize * band.len() as usize;
        Self {
            width,
            band,
            pixels: vec![Color::ZERO; len],
        }
    }

    /// Wrap existing pixels. Returns `None` if the length does not match the band.
    pub fn from_pixels(width: u32, band: RowBand, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == width as usize * band.len() as usize).then_some(Self {
            width,
            band,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows held.
    pub fn height(&self) -> u32 {
        self.band.len()
    }

    /// The image rows this buffer covers.
    pub fn band(&self) -> RowBand {
        self.band
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<Color> {
        self.pixels
    }

    /// Pixels of image row `row`, or `None` if the row is outside the band.
    pub fn row(&self, row: u32) -> Option<&[Color]> {
        if !self.band.contains(row) {
            return None;
        }
        let start = (row - self.band.start) as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Iterate over rows from the top of the band down.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }
}
