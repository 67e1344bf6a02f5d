//! Native camera backend built on `nokhwa`.
//!
//! Desktop backends have no notion of facing mode, so each facing is mapped
//! to a device index through [`CaptureConfig`](super::CaptureConfig).

use super::{Camera, CameraError, Frame, StreamConstraints};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::NokhwaError;

/// Frame rate requested from the device.
const REQUESTED_FPS: u32 = 30;

/// A hardware camera opened through the platform's native API.
#[derive(Default)]
pub struct NativeCamera {
    device: Option<nokhwa::Camera>,
    sequence: u64,
}

impl NativeCamera {
    /// Creates a closed camera; the device is opened on `open`.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Maps a backend error onto the acquisition taxonomy.
///
/// Native backends report failures as free text, so this is keyword based.
fn classify(err: NokhwaError) -> CameraError {
    let detail = err.to_string();
    let lower = detail.to_ascii_lowercase();
    let reason = if ["permission", "denied", "not authorized", "unauthorized"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "NotAllowedError"
    } else if ["not found", "no such", "no device", "invalid index"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "NotFoundError"
    } else if ["busy", "in use", "resource temporarily unavailable"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "NotReadableError"
    } else {
        "NativeError"
    };
    CameraError::from_platform_reason(reason, detail)
}

impl Camera for NativeCamera {
    fn open(&mut self, constraints: &StreamConstraints) -> Result<(), CameraError> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(constraints.ideal_width, constraints.ideal_height),
                FrameFormat::MJPEG,
                REQUESTED_FPS,
            ),
        ));

        let mut device =
            nokhwa::Camera::new(CameraIndex::Index(constraints.device_index), format)
                .map_err(classify)?;
        device.open_stream().map_err(classify)?;

        tracing::info!(
            device = constraints.device_index,
            facing = %constraints.facing,
            format = ?device.camera_format(),
            "Native camera stream opened"
        );

        self.device = Some(device);
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let device = self.device.as_mut().ok_or(CameraError::NotInitialized)?;

        let buffer = device
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(CameraError::NoFrame);
        }

        self.sequence += 1;
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            if let Err(e) = device.stop_stream() {
                tracing::warn!(error = %e, "Failed to stop native camera stream");
            }
            tracing::info!("Native camera closed");
        }
    }
}
