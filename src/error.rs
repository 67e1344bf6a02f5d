//! Error type surfaced by the session orchestrator.

use crate::capture::CameraError;
use crate::normalize::NormalizeError;
use crate::variation::VariationError;
use std::path::PathBuf;
use thiserror::Error;

/// Any failure the orchestrator can surface.
///
/// Every variant renders to exactly one user-facing message through
/// [`ToolError::user_message`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// Normalization or encoding failed.
    #[error(transparent)]
    Processing(#[from] NormalizeError),

    /// An uploaded file could not be read.
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Background processing task did not complete.
    #[error("processing task failed: {0}")]
    Interrupted(String),

    /// Camera acquisition or capture failed.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// Variation request failed.
    #[error(transparent)]
    Variation(#[from] VariationError),

    /// A variation request is already in flight.
    #[error("a variation request is already in progress")]
    Busy,
}

impl ToolError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ToolError::Processing(e) => e.user_message(),
            ToolError::Read { .. } | ToolError::Interrupted(_) => {
                "Error processing image. Please try again.".to_string()
            }
            ToolError::Camera(e) => e.user_message(),
            ToolError::Variation(e) => e.user_message(),
            ToolError::Busy => "Variations are already being generated. Please wait.".to_string(),
        }
    }
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_route_to_source() {
        let err: ToolError = VariationError::RateLimited.into();
        assert_eq!(err.user_message(), "Rate limit exceeded. Please try again later.");

        let err: ToolError = CameraError::from_platform_reason("NotFoundError", "").into();
        assert!(err.user_message().starts_with("No camera found"));

        let err: ToolError = NormalizeError::InvalidTargetSize.into();
        assert_eq!(err.user_message(), "Error processing image. Please try again.");
    }

    #[test]
    fn test_read_error_is_processing_message() {
        let err = ToolError::Read {
            path: PathBuf::from("missing.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.png"));
        assert_eq!(err.user_message(), "Error processing image. Please try again.");
    }
}
