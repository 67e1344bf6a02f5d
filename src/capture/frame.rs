//! Live video frames.

use chrono::{DateTime, Utc};
use image::RgbImage;

/// Shape of a frame relative to the square stills cut from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Wider than tall.
    Landscape,
    /// Taller than wide.
    Portrait,
    /// Equal sides.
    Square,
}

/// One RGB8 frame read from a live stream, tagged with its position in
/// the stream.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wraps an interleaved, row-major RGB8 buffer.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
            captured_at: Utc::now(),
        }
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Position of the frame within its stream, starting at 1.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the frame was read.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Landscape, portrait or square.
    pub fn orientation(&self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => Orientation::Square,
        }
    }

    /// Whether the buffer holds exactly `width * height` RGB pixels.
    pub fn is_valid(&self) -> bool {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3));
        matches!(expected, Some(n) if n > 0 && n == self.pixels.len())
    }

    /// Converts into an image buffer without copying the pixels.
    pub fn into_rgb_image(self) -> Option<RgbImage> {
        if !self.is_valid() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.pixels)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("dimensions", &self.dimensions())
            .field("bytes", &self.pixels.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        assert_eq!(Frame::new(vec![0; 4 * 2 * 3], 4, 2, 0).orientation(), Orientation::Landscape);
        assert_eq!(Frame::new(vec![0; 2 * 4 * 3], 2, 4, 0).orientation(), Orientation::Portrait);
        assert_eq!(Frame::new(vec![0; 3 * 3 * 3], 3, 3, 0).orientation(), Orientation::Square);
    }

    #[test]
    fn test_valid_frame_converts() {
        let mut pixels = vec![0u8; 2 * 2 * 3];
        pixels[3..6].copy_from_slice(&[10, 20, 30]);
        let image = Frame::new(pixels, 2, 2, 7).into_rgb_image().unwrap();

        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let frame = Frame::new(vec![0u8; 100], 640, 480, 1);
        assert!(!frame.is_valid());
        assert!(frame.into_rgb_image().is_none());
    }

    #[test]
    fn test_zero_sized_frame_rejected() {
        assert!(!Frame::new(Vec::new(), 0, 480, 1).is_valid());
    }
}
