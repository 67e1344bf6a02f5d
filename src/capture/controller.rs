//! Camera acquisition lifecycle.
//!
//! ```text
//! Idle → Requesting → Live → Capturing → Stopped
//!            │          ↑        │
//!            │          └────────┘ (no frame / render failure)
//!            └→ Idle (PermissionDenied | DeviceError)
//! ```
//!
//! At most one stream is held at any time: every acquisition is preceded
//! by a release of the previous stream, and every acquisition is paired
//! with exactly one release (on stop, capture, switch or drop).

use super::camera::{Camera, CameraError};
use super::config::{CaptureConfig, FacingMode};
use super::platform::{PermissionPrompt, PlatformCapabilities};
use crate::config::ConfigError;
use crate::normalize::Normalizer;
use crate::source::SourceImage;

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    /// No stream requested yet, or the last request failed.
    Idle,
    /// Waiting for the device to grant a stream.
    Requesting,
    /// A stream is held and frames can be captured.
    Live,
    /// A still is being read from the stream.
    Capturing,
    /// The stream was released after being live.
    Stopped,
}

/// Acquisition/release counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Streams successfully acquired.
    pub acquisitions: u64,
    /// Streams released.
    pub releases: u64,
    /// Acquisition attempts that failed.
    pub failed_acquisitions: u64,
    /// Stills captured.
    pub captures: u64,
}

impl StreamStats {
    /// Streams acquired but not yet released.
    #[inline]
    pub fn active(&self) -> u64 {
        self.acquisitions - self.releases
    }
}

/// Drives a [`Camera`] through acquisition, capture and release.
pub struct CameraController<C: Camera> {
    camera: C,
    config: CaptureConfig,
    platform: PlatformCapabilities,
    normalizer: Normalizer,
    facing: FacingMode,
    state: CameraState,
    permission_prompt: Option<PermissionPrompt>,
    stats: StreamStats,
}

impl<C: Camera> CameraController<C> {
    /// Creates a controller. No stream is acquired until [`start`](Self::start).
    pub fn new(
        camera: C,
        config: CaptureConfig,
        platform: PlatformCapabilities,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            camera,
            normalizer: Normalizer::new(config.target_size),
            facing: config.default_facing,
            config,
            platform,
            state: CameraState::Idle,
            permission_prompt: None,
            stats: StreamStats::default(),
        })
    }

    /// Acquires a stream for `facing`, releasing any held stream first.
    ///
    /// A permission denial additionally raises the recovery prompt.
    pub fn start(&mut self, facing: FacingMode) -> Result<(), CameraError> {
        if self.state == CameraState::Live || self.camera.is_open() {
            self.stop();
        }

        self.facing = facing;
        self.state = CameraState::Requesting;
        let constraints = self.config.constraints(facing);

        match self.camera.open(&constraints) {
            Ok(()) => {
                self.stats.acquisitions += 1;
                self.state = CameraState::Live;
                self.permission_prompt = None;
                tracing::info!(
                    facing = %facing,
                    ideal_width = constraints.ideal_width,
                    ideal_height = constraints.ideal_height,
                    "Camera stream live"
                );
                Ok(())
            }
            Err(err) => {
                self.stats.failed_acquisitions += 1;
                self.state = CameraState::Idle;
                if err.is_permission_denied() {
                    self.permission_prompt = Some(PermissionPrompt::for_family(self.platform.family));
                }
                tracing::warn!(facing = %facing, error = %err, "Camera acquisition failed");
                Err(err)
            }
        }
    }

    /// Toggles between front and rear cameras and reacquires.
    pub fn switch_facing(&mut self) -> Result<(), CameraError> {
        if !self.platform.supports_facing_switch {
            return Err(CameraError::FacingSwitchUnsupported);
        }
        self.start(self.facing.toggled())
    }

    /// Re-attempts acquisition with the current facing mode.
    ///
    /// This is the recovery prompt's retry action.
    pub fn retry(&mut self) -> Result<(), CameraError> {
        self.start(self.facing)
    }

    /// Hides the permission recovery prompt.
    pub fn dismiss_permission_prompt(&mut self) {
        self.permission_prompt = None;
    }

    /// Captures the live frame as a square still and stops the stream.
    ///
    /// Front-facing captures are mirrored to match the preview. Returns
    /// `Ok(None)` without side effects when no live frame is available.
    pub fn capture_photo(&mut self) -> Result<Option<SourceImage>, CameraError> {
        if self.state != CameraState::Live {
            tracing::debug!(state = ?self.state, "Capture ignored, camera not live");
            return Ok(None);
        }

        self.state = CameraState::Capturing;
        let frame = match self.camera.capture() {
            Ok(frame) => frame,
            Err(CameraError::NoFrame) => {
                self.state = CameraState::Live;
                tracing::debug!("Capture ignored, no frame yet");
                return Ok(None);
            }
            Err(err) => {
                self.state = CameraState::Live;
                return Err(err);
            }
        };

        let (frame_width, frame_height) = frame.dimensions();
        let orientation = frame.orientation();
        let sequence = frame.sequence();
        let Some(pixels) = frame.into_rgb_image() else {
            self.state = CameraState::Live;
            return Err(CameraError::CaptureFailed(format!(
                "frame buffer does not match {frame_width}x{frame_height}"
            )));
        };

        let rendered = match self.normalizer.render_frame(&pixels, self.facing.is_mirrored()) {
            Ok(rendered) => rendered,
            Err(err) => {
                self.state = CameraState::Live;
                return Err(err.into());
            }
        };

        self.stats.captures += 1;
        tracing::info!(
            facing = %self.facing,
            frame = sequence,
            frame_width,
            frame_height,
            orientation = ?orientation,
            mirrored = self.facing.is_mirrored(),
            "Captured photo"
        );

        let source = SourceImage::from_capture(rendered, self.facing, sequence);
        self.stop();
        Ok(Some(source))
    }

    /// Releases the held stream, if any. Idempotent.
    pub fn stop(&mut self) {
        if self.camera.is_open() {
            self.camera.close();
            self.stats.releases += 1;
            tracing::info!(facing = %self.facing, "Camera stream released");
        }
        if self.state != CameraState::Idle {
            self.state = CameraState::Stopped;
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Facing mode of the current or last stream.
    #[inline]
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Whether a stream is held and ready to capture.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.state == CameraState::Live
    }

    /// Whether a front/back switch control should be offered.
    #[inline]
    pub fn can_switch_facing(&self) -> bool {
        self.platform.supports_facing_switch
    }

    /// The pending permission recovery prompt, if any.
    pub fn permission_prompt(&self) -> Option<&PermissionPrompt> {
        self.permission_prompt.as_ref()
    }

    /// Acquisition and release counters.
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// The underlying camera.
    pub fn camera(&self) -> &C {
        &self.camera
    }
}

impl<C: Camera> Drop for CameraController<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
