//! Camera acquisition and still capture.
//!
//! This module provides the device abstraction ([`Camera`]), the
//! acquisition state machine ([`CameraController`]) and the platform
//! capability description used for permission recovery and the
//! front/back switch.

mod camera;
mod config;
mod controller;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod platform;

pub use camera::{Camera, CameraError, MockCamera, MockStreamStats};
pub use config::{CaptureConfig, FacingMode, StreamConstraints};
pub use controller::{CameraController, CameraState, StreamStats};
pub use frame::{Frame, Orientation};
#[cfg(feature = "camera")]
pub use native::NativeCamera;
pub use platform::{PermissionPrompt, PlatformCapabilities, PlatformFamily};
