//! Configuration file format.
//!
//! Every section is optional and falls back to defaults, so an empty file
//! (or no file at all) is a valid configuration. The API credential is not
//! part of the file; it is read once from the environment at startup.

use crate::capture::{CaptureConfig, PlatformCapabilities, PlatformFamily};
use crate::normalize::DEFAULT_TARGET_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default environment variable holding the API credential.
pub const DEFAULT_CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Ideal width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Aspect ratio is not a positive finite number.
    #[error("invalid aspect ratio (must be a positive number)")]
    InvalidAspectRatio,
    /// Output edge length is zero.
    #[error("invalid target size (must be non-zero)")]
    InvalidTargetSize,
    /// Variation count is outside 1-10.
    #[error("invalid variation count (must be 1-10)")]
    InvalidVariationCount,
    /// Base URL is not http(s).
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Normalization settings.
    #[serde(default)]
    pub normalize: NormalizeConfig,
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Host platform description.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// CLI output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Output edge length in pixels.
    pub target_size: u32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
        }
    }
}

/// Remote variation API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the images API.
    pub base_url: String,
    /// Model name sent with each request, if any.
    pub model: Option<String>,
    /// Number of variations to request.
    pub count: u32,
    /// Environment variable the credential is read from.
    pub credential_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: None,
            count: 4,
            credential_env: DEFAULT_CREDENTIAL_ENV.to_string(),
        }
    }
}

/// Host platform description.
///
/// When `user_agent` is set the family and switch capability are inferred
/// from it; otherwise the explicit fields are used as-is.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform family when no user agent is given.
    pub family: PlatformFamily,
    /// Whether front/rear switching is offered.
    pub supports_facing_switch: bool,
    /// User agent to infer the platform from.
    pub user_agent: Option<String>,
}

impl PlatformConfig {
    /// Resolves the capabilities handed to the camera controller.
    pub fn capabilities(&self) -> PlatformCapabilities {
        match &self.user_agent {
            Some(ua) => PlatformCapabilities::from_user_agent(ua),
            None => PlatformCapabilities {
                family: self.family,
                supports_facing_switch: self.supports_facing_switch,
            },
        }
    }
}

/// Where the CLI writes its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for normalized and captured images.
    pub directory: PathBuf,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.normalize.target_size == 0 {
            return Err(ConfigError::InvalidTargetSize);
        }
        if self.api.count == 0 || self.api.count > 10 {
            return Err(ConfigError::InvalidVariationCount);
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }
        Ok(())
    }

    /// The `WxH` size string sent with variation requests.
    pub fn variation_size(&self) -> String {
        format!(
            "{}x{}",
            self.normalize.target_size, self.normalize.target_size
        )
    }
}
