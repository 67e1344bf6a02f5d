//! Camera acquisition configuration.
//!
//! A square capture is requested up front (1:1, ideal 1024×1024) so the
//! live frame needs as little cropping as possible at capture time.

use crate::config::ConfigError;
use crate::normalize::DEFAULT_TARGET_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera orientation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing ("selfie") camera. Previewed mirrored.
    User,
    /// Rear-facing camera.
    #[default]
    Environment,
}

impl FacingMode {
    /// Returns the opposite facing mode.
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    /// Whether previews and captures are horizontally mirrored.
    #[inline]
    pub fn is_mirrored(self) -> bool {
        self == FacingMode::User
    }

    /// Constraint value as used by media APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints for a single stream acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConstraints {
    /// Requested facing mode.
    pub facing: FacingMode,
    /// Preferred frame width in pixels.
    pub ideal_width: u32,
    /// Preferred frame height in pixels.
    pub ideal_height: u32,
    /// Preferred width / height ratio.
    pub aspect_ratio: f64,
    /// Device index for backends that address cameras by number.
    pub device_index: u32,
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Preferred frame width in pixels.
    pub ideal_width: u32,
    /// Preferred frame height in pixels.
    pub ideal_height: u32,
    /// Preferred width / height ratio.
    pub aspect_ratio: f64,
    /// Facing mode used when none is given.
    pub default_facing: FacingMode,
    /// Edge length of captured stills.
    pub target_size: u32,
    /// Device index used for the front-facing camera.
    pub user_device: u32,
    /// Device index used for the rear-facing camera.
    pub environment_device: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1024,
            ideal_height: 1024,
            aspect_ratio: 1.0,
            default_facing: FacingMode::Environment,
            target_size: DEFAULT_TARGET_SIZE,
            user_device: 0,
            environment_device: 0,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with a custom still size.
    pub fn with_target_size(target_size: u32) -> Self {
        Self {
            target_size,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio);
        }
        if self.target_size == 0 {
            return Err(ConfigError::InvalidTargetSize);
        }
        Ok(())
    }

    /// Builds acquisition constraints for the given facing mode.
    pub fn constraints(&self, facing: FacingMode) -> StreamConstraints {
        StreamConstraints {
            facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            aspect_ratio: self.aspect_ratio,
            device_index: match facing {
                FacingMode::User => self.user_device,
                FacingMode::Environment => self.environment_device,
            },
        }
    }
}
