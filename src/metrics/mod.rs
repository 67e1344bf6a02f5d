//! Prometheus metrics for session monitoring.
//!
//! # Metrics Exposed
//!
//! ## Source Metrics
//! - `image_variations_uploads_total` - Uploads normalized successfully
//! - `image_variations_captures_total` - Camera stills selected
//! - `image_variations_processing_failures_total` - Uploads that failed to normalize
//!
//! ## Request Metrics
//! - `image_variations_requests_total` - Variation requests sent
//! - `image_variations_request_failures_total` - Variation requests that failed
//! - `image_variations_received_total` - Generated images received
//! - `image_variations_loading` - Whether a request is in flight
//!
//! ## Camera Metrics
//! - `image_variations_camera_acquisitions_total` - Streams acquired
//! - `image_variations_camera_releases_total` - Streams released
//! - `image_variations_camera_failures_total` - Failed acquisitions
//! - `image_variations_camera_active_streams` - Streams currently held (0 or 1)
//!
//! # Example
//!
//! ```no_run
//! use image_variations::capture::StreamStats;
//! use image_variations::metrics::{MetricsRegistry, MetricsSnapshot};
//! use image_variations::session::ToolStats;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let snapshot =
//!     MetricsSnapshot::from_components(&ToolStats::default(), false, &StreamStats::default());
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, ServerError};
