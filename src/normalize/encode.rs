//! Pixel-level steps shared by upload normalization and camera capture.

use super::NormalizeError;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage};

/// Opaque white used behind transparent sources.
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Composites an image onto an opaque white canvas.
///
/// Sources without an alpha channel are converted directly.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), BACKGROUND);

    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = u16::from(src[3]);
        for c in 0..3 {
            let blended =
                u16::from(src[c]) * alpha + u16::from(BACKGROUND[c]) * (255 - alpha) + 127;
            dst[c] = (blended / 255) as u8;
        }
    }

    out
}

/// Encodes an RGB image as PNG with default compression.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, NormalizeError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(NormalizeError::Encoding)?;

    if buffer.is_empty() {
        return Err(NormalizeError::EmptyOutput);
    }

    Ok(buffer)
}
