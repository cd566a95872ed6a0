//! Cropping generated images to the display frame.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use super::GenerateError;

/// Width of the frame every generated picture is fitted to.
pub const FRAME_WIDTH: u32 = 900;

/// Height of the frame every generated picture is fitted to.
pub const FRAME_HEIGHT: u32 = 520;

/// Scales `bytes` to cover `width x height`, center-crops the overflow and
/// re-encodes the result as an RGB PNG.
pub fn fit_image(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GenerateError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let fitted = rgb.resize_to_fill(width, height, FilterType::Lanczos3);

    let mut out = Vec::new();
    fitted.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}
