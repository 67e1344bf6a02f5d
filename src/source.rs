//! The currently selected source image.

use crate::capture::FacingMode;
use crate::normalize::NormalizedImage;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Where a source image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    /// A user-selected file.
    Upload {
        /// Name of the uploaded file.
        file_name: String,
    },
    /// A still taken from a live camera stream.
    Camera {
        /// Camera the still was taken with.
        facing: FacingMode,
        /// Sequence number of the captured frame.
        frame: u64,
    },
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageOrigin::Upload { file_name } => write!(f, "upload:{file_name}"),
            ImageOrigin::Camera { facing, frame } => write!(f, "camera:{facing}#{frame}"),
        }
    }
}

/// A normalized, PNG-encoded square image ready for submission.
///
/// Replaced wholesale whenever a new source is selected; the buffer is
/// shared so an in-flight request can keep it alive after replacement.
#[derive(Clone)]
pub struct SourceImage {
    png: Arc<[u8]>,
    size: u32,
    origin: ImageOrigin,
    selected_at: DateTime<Utc>,
}

impl SourceImage {
    /// Wraps a normalized image, stamping the selection time.
    pub fn new(image: NormalizedImage, origin: ImageOrigin) -> Self {
        Self {
            png: image.png.into(),
            size: image.size,
            origin,
            selected_at: Utc::now(),
        }
    }

    pub(crate) fn from_capture(image: NormalizedImage, facing: FacingMode, frame: u64) -> Self {
        Self::new(image, ImageOrigin::Camera { facing, frame })
    }

    /// PNG-encoded bytes.
    #[inline]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub(crate) fn shared_png(&self) -> Arc<[u8]> {
        Arc::clone(&self.png)
    }

    /// Edge length in pixels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Where the image came from.
    #[inline]
    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// When the image was selected.
    #[inline]
    pub fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }

    /// Display handle for this image.
    pub fn display_ref(&self) -> String {
        format!("{}@{}", self.origin, self.selected_at.timestamp_millis())
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("png_bytes", &self.png.len())
            .field("selected_at", &self.selected_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized() -> NormalizedImage {
        NormalizedImage {
            png: vec![1, 2, 3],
            size: 64,
        }
    }

    #[test]
    fn test_clones_share_buffer() {
        let image = SourceImage::new(
            normalized(),
            ImageOrigin::Upload {
                file_name: "a.png".to_string(),
            },
        );
        let copy = image.clone();
        assert!(Arc::ptr_eq(&image.shared_png(), &copy.shared_png()));
        assert_eq!(copy.png(), &[1, 2, 3]);
    }

    #[test]
    fn test_capture_origin_display() {
        let image = SourceImage::from_capture(normalized(), FacingMode::User, 12);
        assert_eq!(image.origin().to_string(), "camera:user#12");
        assert!(image.display_ref().starts_with("camera:user#12@"));
    }

    #[test]
    fn test_debug_omits_pixels() {
        let image = SourceImage::from_capture(normalized(), FacingMode::Environment, 1);
        let debug = format!("{image:?}");
        assert!(debug.contains("png_bytes: 3"));
    }
}
