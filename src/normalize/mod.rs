//! Image normalization.
//!
//! Turns an arbitrary source image into a fixed-size, opaque, PNG-encoded
//! square. The pipeline is:
//!
//! ```text
//! decode → center crop (shorter edge) → flatten on white → resize N×N → PNG
//! ```
//!
//! Nothing outside the centered crop survives, so the output is never
//! letterboxed and the cropped region keeps its aspect ratio.

mod crop;
mod encode;

pub use crop::SquareCrop;
pub use encode::{encode_png, flatten_on_white};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Default output edge length in pixels.
pub const DEFAULT_TARGET_SIZE: u32 = 1024;

/// Errors that can occur while normalizing an image.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    /// The decoded image has zero width or height.
    #[error("source image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },
    /// Target size is zero.
    #[error("target size must be non-zero")]
    InvalidTargetSize,
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Encoding(#[source] image::ImageError),
    /// The encoder wrote no bytes.
    #[error("encoder produced no output")]
    EmptyOutput,
}

impl NormalizeError {
    /// Message shown to the user for any processing failure.
    pub fn user_message(&self) -> String {
        "Error processing image. Please try again.".to_string()
    }
}

/// A normalized square image.
#[derive(Clone)]
pub struct NormalizedImage {
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
    /// Edge length of the square.
    pub size: u32,
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("size", &self.size)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

/// Crops, resizes and re-encodes images to a fixed square size.
#[derive(Debug, Clone)]
pub struct Normalizer {
    target_size: u32,
    filter: FilterType,
}

impl Normalizer {
    /// Creates a normalizer producing `target_size × target_size` output.
    pub fn new(target_size: u32) -> Self {
        Self {
            target_size,
            filter: FilterType::Lanczos3,
        }
    }

    /// Overrides the resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the output edge length.
    #[inline]
    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Decodes raw file bytes and normalizes the result.
    ///
    /// An EXIF orientation tag is applied before cropping, so the crop is
    /// taken from the image as it is meant to be viewed.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<NormalizedImage, NormalizeError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| NormalizeError::Decode(e.into()))?
            .into_decoder()
            .map_err(NormalizeError::Decode)?;
        let orientation = decoder.orientation().map_err(NormalizeError::Decode)?;
        let mut img = DynamicImage::from_decoder(decoder).map_err(NormalizeError::Decode)?;
        img.apply_orientation(orientation);

        tracing::debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            orientation = ?orientation,
            "Decoded source image"
        );
        self.normalize_image(&img)
    }

    /// Normalizes an already-decoded image.
    pub fn normalize_image(&self, img: &DynamicImage) -> Result<NormalizedImage, NormalizeError> {
        self.check_target()?;
        let (width, height) = img.dimensions();
        let crop = SquareCrop::centered(width, height);
        if crop.is_empty() {
            return Err(NormalizeError::EmptyImage { width, height });
        }

        let cropped = if crop.is_full(width, height) {
            flatten_on_white(img)
        } else {
            flatten_on_white(&img.crop_imm(crop.x, crop.y, crop.size, crop.size))
        };

        let square = self.resize(cropped);
        let png = encode_png(&square)?;

        tracing::debug!(
            source_width = width,
            source_height = height,
            crop_x = crop.x,
            crop_y = crop.y,
            crop_size = crop.size,
            target = self.target_size,
            png_bytes = png.len(),
            "Normalized image"
        );

        Ok(NormalizedImage {
            png,
            size: self.target_size,
        })
    }

    /// Renders a live camera frame into the target square.
    ///
    /// Non-square frames are center-cropped. When `mirror` is set the
    /// output is flipped horizontally so it matches a mirrored preview.
    pub fn render_frame(
        &self,
        frame: &RgbImage,
        mirror: bool,
    ) -> Result<NormalizedImage, NormalizeError> {
        self.check_target()?;
        let (width, height) = frame.dimensions();
        let crop = SquareCrop::centered(width, height);
        if crop.is_empty() {
            return Err(NormalizeError::EmptyImage { width, height });
        }

        let cropped = if crop.is_full(width, height) {
            frame.clone()
        } else {
            imageops::crop_imm(frame, crop.x, crop.y, crop.size, crop.size).to_image()
        };

        let mut square = self.resize(cropped);
        if mirror {
            imageops::flip_horizontal_in_place(&mut square);
        }

        Ok(NormalizedImage {
            png: encode_png(&square)?,
            size: self.target_size,
        })
    }

    fn check_target(&self) -> Result<(), NormalizeError> {
        if self.target_size == 0 {
            return Err(NormalizeError::InvalidTargetSize);
        }
        Ok(())
    }

    fn resize(&self, square: RgbImage) -> RgbImage {
        if square.width() == self.target_size && square.height() == self.target_size {
            return square;
        }
        imageops::resize(&square, self.target_size, self.target_size, self.filter)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory(png).unwrap().to_rgb8()
    }

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    /// Three vertical bands: red | green | blue, with the green band
    /// exactly covering the centered square.
    fn banded(width: u32, height: u32) -> RgbImage {
        let band = (width - height) / 2;
        RgbImage::from_fn(width, height, |x, _| {
            if x < band {
                Rgb([255, 0, 0])
            } else if x < band + height {
                Rgb([0, 255, 0])
            } else {
                Rgb([0, 0, 255])
            }
        })
    }

    fn close_to(a: Rgb<u8>, b: Rgb<u8>) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
    }

    /// Splices an EXIF APP1 segment carrying `orientation` after the SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        // Big-endian TIFF header, first IFD at offset 8.
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        // One entry: Orientation (0x0112), SHORT, count 1.
        app1.extend_from_slice(&[0x00, 0x01, 0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&[0x00, orientation, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_exif_rotation_applied_before_crop() {
        // Red on the left, blue on the right; orientation 6 rotates 90°
        // clockwise for display, which puts red on top.
        let raw = RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 100)
            .encode_image(&raw)
            .unwrap();
        let tagged = with_exif_orientation(&jpeg, 6);

        let out = decode(&Normalizer::new(16).normalize_bytes(&tagged).unwrap().png);
        let is_red = |p: &Rgb<u8>| p.0[0] > 200 && p.0[2] < 60;
        let is_blue = |p: &Rgb<u8>| p.0[2] > 200 && p.0[0] < 60;
        assert!(is_red(out.get_pixel(13, 2)));
        assert!(is_red(out.get_pixel(2, 2)));
        assert!(is_blue(out.get_pixel(2, 13)));
        assert!(is_blue(out.get_pixel(13, 13)));
    }

    #[test]
    fn test_untagged_jpeg_keeps_layout() {
        let raw = RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 100)
            .encode_image(&raw)
            .unwrap();

        let out = decode(&Normalizer::new(16).normalize_bytes(&jpeg).unwrap().png);
        assert!(out.get_pixel(2, 13).0[0] > 200);
        assert!(out.get_pixel(13, 2).0[2] > 200);
    }

    #[test]
    fn test_landscape_keeps_only_center() {
        let normalizer = Normalizer::new(16);
        let out = normalizer
            .normalize_image(&DynamicImage::ImageRgb8(banded(40, 20)))
            .unwrap();

        let img = decode(&out.png);
        assert_eq!(img.dimensions(), (16, 16));
        assert!(img.pixels().all(|p| close_to(*p, Rgb([0, 255, 0]))));
    }

    #[test]
    fn test_upload_scenario_2000x1000() {
        let normalizer = Normalizer::default().with_filter(FilterType::Triangle);
        let bytes = encode(DynamicImage::ImageRgb8(banded(2000, 1000)));

        let out = normalizer.normalize_bytes(&bytes).unwrap();
        assert_eq!(out.size, 1024);

        let img = decode(&out.png);
        assert_eq!(img.dimensions(), (1024, 1024));
        assert!(close_to(*img.get_pixel(0, 0), Rgb([0, 255, 0])));
        assert!(close_to(*img.get_pixel(1023, 512), Rgb([0, 255, 0])));
    }

    #[test]
    fn test_square_input_is_content_noop() {
        let src = RgbImage::from_fn(32, 32, |x, y| Rgb([x as u8 * 7, y as u8 * 5, 99]));
        let out = Normalizer::new(32)
            .normalize_image(&DynamicImage::ImageRgb8(src.clone()))
            .unwrap();
        assert_eq!(decode(&out.png), src);
    }

    #[test]
    fn test_transparent_source_is_opaque_white() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        let out = Normalizer::new(8)
            .normalize_image(&DynamicImage::ImageRgba8(src))
            .unwrap();

        let decoded = image::load_from_memory(&out.png).unwrap();
        assert!(!decoded.color().has_alpha());
        assert!(decoded.to_rgb8().pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let result = Normalizer::default().normalize_bytes(b"definitely not an image");
        assert!(matches!(result, Err(NormalizeError::Decode(_))));
    }

    #[test]
    fn test_zero_target_rejected() {
        let src = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(
            Normalizer::new(0).normalize_image(&src),
            Err(NormalizeError::InvalidTargetSize)
        ));
    }

    #[test]
    fn test_render_frame_mirrors() {
        let frame = RgbImage::from_fn(8, 8, |x, _| Rgb([x as u8 * 30, 0, 0]));
        let normalizer = Normalizer::new(8);

        let plain = decode(&normalizer.render_frame(&frame, false).unwrap().png);
        let mirrored = decode(&normalizer.render_frame(&frame, true).unwrap().png);

        assert_eq!(plain, frame);
        for x in 0..8 {
            assert_eq!(mirrored.get_pixel(x, 3), frame.get_pixel(7 - x, 3));
        }
    }

    #[test]
    fn test_render_frame_crops_portrait() {
        let frame = RgbImage::from_fn(4, 8, |_, y| {
            if (2..6).contains(&y) {
                Rgb([0, 0, 200])
            } else {
                Rgb([200, 0, 0])
            }
        });
        let out = decode(&Normalizer::new(4).render_frame(&frame, false).unwrap().png);
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 200])));
    }
}
