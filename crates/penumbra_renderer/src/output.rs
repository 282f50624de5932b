//! Tone mapping and image file output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::{clamp_01, Color, PixelBuffer};
use thiserror::Error;

/// Display gamma applied when quantizing.
pub const GAMMA: f64 = 2.2;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported output format: {0:?} (expected .ppm or .png)")]
    UnsupportedFormat(String),

    #[error("Image of {width}x{height} does not fit the encoder")]
    Size { width: u32, height: u32 },
}

/// Gamma-encode a linear value, clamping it to [0, 1] first.
#[inline]
pub fn linear_to_gamma(x: f64) -> f64 {
    clamp_01(x).powf(1.0 / GAMMA)
}

/// Quantize a linear value to a byte with rounding to nearest.
#[inline]
pub fn to_byte(x: f64) -> u8 {
    // Always within 0.5..=255.5 before truncation
    (linear_to_gamma(x) * 255.0 + 0.5) as u8
}

/// Convert a linear color to 8-bit RGB.
#[inline]
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    [to_byte(color.x), to_byte(color.y), to_byte(color.z)]
}

/// Flatten an image into tightly packed RGB bytes, top row first.
pub fn encode_rgb(image: &PixelBuffer) -> Vec<u8> {
    image.pixels().iter().flat_map(|&c| color_to_rgb(c)).collect()
}

/// Write an image as plain-text PPM (P3).
///
/// The header is `P3`, then `width height`, then `255`, each on its own
/// line. Each image row follows on one line as space-separated `r g b`
/// triples, top row first.
pub fn write_ppm<W: Write>(image: &PixelBuffer, mut writer: W) -> io::Result<()> {
    write!(writer, "P3\n{} {}\n255\n", image.width(), image.height())?;
    for row in image.rows() {
        let mut first = true;
        for &color in row {
            let [r, g, b] = color_to_rgb(color);
            if !first {
                writer.write_all(b" ")?;
            }
            write!(writer, "{r} {g} {b}")?;
            first = false;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Save an image, choosing the format from the file extension.
///
/// `.ppm` writes plain-text PPM, `.png` writes 8-bit RGB PNG.
pub fn save_image(image: &PixelBuffer, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "ppm" => {
            let file = File::create(path)?;
            write_ppm(image, BufWriter::new(file))?;
        }
        "png" => {
            let (width, height) = (image.width(), image.height());
            let rgb = image::RgbImage::from_raw(width, height, encode_rgb(image))
                .ok_or(OutputError::Size { width, height })?;
            rgb.save_with_format(path, image::ImageFormat::Png)?;
        }
        _ => return Err(OutputError::UnsupportedFormat(path.display().to_string())),
    }

    log::info!("Saved {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}
