//! Camera devices and the acquisition error taxonomy.
//!
//! [`Camera`] is the seam between the controller and a concrete backend;
//! [`MockCamera`] produces synthetic frames and records stream usage.

use super::{Frame, StreamConstraints};
use crate::normalize::NormalizeError;
use std::collections::VecDeque;
use thiserror::Error;

/// Acquisition and capture failures.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The user or platform refused camera access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// No camera matches the requested constraints.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The camera exists but could not be started.
    #[error("camera device busy: {0}")]
    DeviceBusy(String),
    /// Any other platform failure.
    #[error("camera error ({reason}): {detail}")]
    Unknown {
        /// Platform error name.
        reason: String,
        /// Platform error text.
        detail: String,
    },
    /// Reading or decoding a frame failed.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The stream has not produced a frame yet.
    #[error("no frame available")]
    NoFrame,
    /// No stream is open.
    #[error("camera not initialized")]
    NotInitialized,
    /// The platform cannot switch between front and rear cameras.
    #[error("switching cameras is not supported on this platform")]
    FacingSwitchUnsupported,
    /// Cropping or encoding the still failed.
    #[error("failed to render captured frame: {0}")]
    Render(#[from] NormalizeError),
}

impl CameraError {
    /// Classifies a platform-reported acquisition failure.
    ///
    /// `reason` is the platform's error name (e.g. `NotAllowedError`).
    pub fn from_platform_reason(reason: &str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match reason {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                CameraError::PermissionDenied(detail)
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                CameraError::DeviceNotFound(detail)
            }
            "NotReadableError" | "TrackStartError" | "AbortError" => CameraError::DeviceBusy(detail),
            other => CameraError::Unknown {
                reason: other.to_string(),
                detail,
            },
        }
    }

    /// Returns true if the user must grant camera access before retrying.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CameraError::PermissionDenied(_))
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied(_) => {
                "Camera access was denied. Allow camera access and try again."
            }
            CameraError::DeviceNotFound(_) => {
                "No camera found. Please ensure your device has a working camera."
            }
            CameraError::DeviceBusy(_) => {
                "Camera is in use by another application. Please close other apps using the camera."
            }
            CameraError::Unknown { .. } => {
                "Error accessing camera. Please check your device settings."
            }
            CameraError::FacingSwitchUnsupported => {
                "Switching cameras is not supported on this device."
            }
            CameraError::CaptureFailed(_)
            | CameraError::NoFrame
            | CameraError::NotInitialized
            | CameraError::Render(_) => "Error capturing photo. Please try again.",
        }
        .to_string()
    }
}

/// Trait for camera implementations.
///
/// An open camera holds exactly one live stream. Callers are responsible
/// for closing before reopening; implementations do not do it for them.
pub trait Camera {
    /// Acquires a live stream matching the constraints as closely as possible.
    fn open(&mut self, constraints: &StreamConstraints) -> Result<(), CameraError>;

    /// Reads the current live frame.
    ///
    /// Returns [`CameraError::NoFrame`] if the stream has not produced one yet.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if a stream is currently held.
    fn is_open(&self) -> bool;

    /// Releases every track of the held stream. Idempotent.
    fn close(&mut self);
}

/// Stream bookkeeping kept by [`MockCamera`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStreamStats {
    /// Successful acquisitions.
    pub opens: u64,
    /// Releases.
    pub closes: u64,
    /// Streams currently held.
    pub active: u64,
    /// Highest number of simultaneously held streams.
    pub peak_active: u64,
}

/// Synthetic camera backend.
///
/// Frames carry a horizontal red ramp and a vertical green ramp, so
/// orientation changes are visible in tests.
#[derive(Debug, Default)]
pub struct MockCamera {
    constraints: Option<StreamConstraints>,
    frame_size: Option<(u32, u32)>,
    failures: VecDeque<(String, String)>,
    frameless: bool,
    sequence: u64,
    stats: MockStreamStats,
}

impl MockCamera {
    /// Creates a mock whose frames match the requested ideal size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces frames of a fixed size instead of the ideal constraint size.
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    /// Queues an acquisition failure, consumed by the next `open`.
    pub fn fail_next_open(mut self, reason: &str, detail: &str) -> Self {
        self.push_failure(reason, detail);
        self
    }

    /// Queues an acquisition failure on an existing camera.
    pub fn push_failure(&mut self, reason: &str, detail: &str) {
        self.failures
            .push_back((reason.to_string(), detail.to_string()));
    }

    /// Opens succeed but no frame is ever produced.
    pub fn frameless(mut self) -> Self {
        self.frameless = true;
        self
    }

    /// Stream bookkeeping so far.
    pub fn stats(&self) -> MockStreamStats {
        self.stats
    }

    /// Constraints of the most recent successful acquisition.
    pub fn constraints(&self) -> Option<&StreamConstraints> {
        self.constraints.as_ref()
    }

    fn synthetic_pixels(width: u32, height: u32, sequence: u64) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        let x_span = width.saturating_sub(1).max(1);
        let y_span = height.saturating_sub(1).max(1);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / x_span) as u8);
                pixels.push((y * 255 / y_span) as u8);
                pixels.push((sequence % 256) as u8);
            }
        }
        pixels
    }
}

impl Camera for MockCamera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<(), CameraError> {
        if let Some((reason, detail)) = self.failures.pop_front() {
            tracing::debug!(%reason, "MockCamera refusing acquisition");
            return Err(CameraError::from_platform_reason(&reason, detail));
        }

        self.constraints = Some(constraints.clone());
        self.sequence = 0;
        self.stats.opens += 1;
        self.stats.active += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.stats.active);
        tracing::info!(facing = %constraints.facing, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let constraints = self.constraints.as_ref().ok_or(CameraError::NotInitialized)?;
        if self.frameless {
            return Err(CameraError::NoFrame);
        }

        let (width, height) = self
            .frame_size
            .unwrap_or((constraints.ideal_width, constraints.ideal_height));

        self.sequence += 1;
        Ok(Frame::new(
            Self::synthetic_pixels(width, height, self.sequence),
            width,
            height,
            self.sequence,
        ))
    }

    fn is_open(&self) -> bool {
        self.constraints.is_some()
    }

    fn close(&mut self) {
        if self.constraints.take().is_some() {
            self.stats.closes += 1;
            self.stats.active -= 1;
            tracing::info!("MockCamera closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, FacingMode};

    fn constraints() -> StreamConstraints {
        CaptureConfig::default().constraints(FacingMode::Environment)
    }

    #[test]
    fn test_mock_camera_lifecycle() {
        let mut camera = MockCamera::new().with_frame_size(16, 16);

        assert!(!camera.is_open());

        camera.open(&constraints()).unwrap();
        assert!(camera.is_open());

        let frame = camera.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = camera.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close();
        camera.close();
        assert!(!camera.is_open());
        assert_eq!(camera.stats().closes, 1);
        assert_eq!(camera.stats().active, 0);
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = MockCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_scripted_failure_consumed_once() {
        let mut camera = MockCamera::new().fail_next_open("NotReadableError", "in use");
        assert!(matches!(
            camera.open(&constraints()),
            Err(CameraError::DeviceBusy(_))
        ));
        assert!(camera.open(&constraints()).is_ok());
    }

    #[test]
    fn test_reason_classification() {
        assert!(CameraError::from_platform_reason("NotAllowedError", "").is_permission_denied());
        assert!(CameraError::from_platform_reason("PermissionDeniedError", "")
            .is_permission_denied());
        assert!(matches!(
            CameraError::from_platform_reason("NotFoundError", ""),
            CameraError::DeviceNotFound(_)
        ));
        assert!(matches!(
            CameraError::from_platform_reason("TypeError", "bad"),
            CameraError::Unknown { .. }
        ));
    }

    #[test]
    fn test_distinct_acquisition_messages() {
        let messages: Vec<String> = ["NotAllowedError", "NotFoundError", "NotReadableError", "X"]
            .iter()
            .map(|r| CameraError::from_platform_reason(r, "").user_message())
            .collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
