//! Image Variations Library
//!
//! Takes a source image from a file upload or a camera still, normalizes it
//! to an opaque PNG square, and asks a remote image-generation service for
//! variations of it.
//!
//! # Architecture
//!
//! ```text
//! upload ──► normalize ──┐
//!                        ├──► session ──► variation ──► remote API
//! camera ──► capture ────┘       │
//!                                └──► metrics
//! ```
//!
//! The remote API and the host platform are both injected: the session is
//! generic over [`VariationApi`](variation::VariationApi), and the camera
//! controller is generic over [`Camera`](capture::Camera) and takes its
//! [`PlatformCapabilities`](capture::PlatformCapabilities) as a value.
//!
//! # Example
//!
//! ```no_run
//! use image_variations::{
//!     capture::{CameraController, CaptureConfig, FacingMode, MockCamera, PlatformCapabilities},
//!     normalize::Normalizer,
//!     session::VariationTool,
//!     variation::{ApiCredential, OpenAiImages, VariationClient},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = OpenAiImages::new("https://api.openai.com/v1")?;
//! let client = VariationClient::new(api, ApiCredential::from_env("OPENAI_API_KEY"), "1024x1024");
//! let mut tool = VariationTool::new(client, Normalizer::default());
//!
//! let mut camera = CameraController::new(
//!     MockCamera::new(),
//!     CaptureConfig::default(),
//!     PlatformCapabilities::desktop(),
//! )?;
//! camera.start(FacingMode::User)?;
//! if let Some(still) = camera.capture_photo()? {
//!     tool.accept_capture(still);
//! }
//!
//! tool.generate().await?;
//! for reference in tool.variations().map(|v| v.references()).unwrap_or_default() {
//!     println!("{reference}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod session;
pub mod source;
pub mod variation;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types at crate root
pub use capture::{Camera, CameraController, CameraError, CaptureConfig, FacingMode, MockCamera};
pub use config::FileConfig;
pub use error::{Result, ToolError};
pub use normalize::{NormalizedImage, Normalizer};
pub use session::VariationTool;
pub use source::{ImageOrigin, SourceImage};
pub use variation::{ApiCredential, VariationApi, VariationClient, VariationError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
