//! Metrics collection and registry.

use crate::capture::StreamStats;
use crate::session::ToolStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Uploads normalized successfully.
    pub uploads: u64,
    /// Camera stills selected.
    pub captures: u64,
    /// Uploads that failed to read or normalize.
    pub processing_failures: u64,
    /// Variation requests admitted.
    pub requests: u64,
    /// Variation requests that failed.
    pub request_failures: u64,
    /// Generated images received.
    pub variations_received: u64,
    /// Whether a variation request is in flight.
    pub loading: bool,
    /// Camera streams acquired.
    pub stream_acquisitions: u64,
    /// Camera streams released.
    pub stream_releases: u64,
    /// Camera acquisitions that failed.
    pub stream_failures: u64,
}

/// Prometheus metrics registry for session monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Source metrics
    uploads_total: IntCounter,
    captures_total: IntCounter,
    processing_failures_total: IntCounter,

    // Request metrics
    requests_total: IntCounter,
    request_failures_total: IntCounter,
    variations_received_total: IntCounter,
    loading: IntGauge,

    // Camera metrics
    stream_acquisitions_total: IntCounter,
    stream_releases_total: IntCounter,
    stream_failures_total: IntCounter,
    active_streams: IntGauge,
}

/// Advances a counter to `target`; counters never go backwards.
fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all session metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let uploads_total = IntCounter::new(
            "image_variations_uploads_total",
            "Uploaded images normalized successfully",
        )?;
        let captures_total = IntCounter::new(
            "image_variations_captures_total",
            "Camera stills selected as source",
        )?;
        let processing_failures_total = IntCounter::new(
            "image_variations_processing_failures_total",
            "Uploads that could not be read or normalized",
        )?;

        let requests_total = IntCounter::new(
            "image_variations_requests_total",
            "Variation requests sent",
        )?;
        let request_failures_total = IntCounter::new(
            "image_variations_request_failures_total",
            "Variation requests that failed",
        )?;
        let variations_received_total = IntCounter::new(
            "image_variations_received_total",
            "Generated images received",
        )?;
        let loading = IntGauge::new(
            "image_variations_loading",
            "Whether a variation request is in flight (1=yes, 0=no)",
        )?;

        let stream_acquisitions_total = IntCounter::new(
            "image_variations_camera_acquisitions_total",
            "Camera streams acquired",
        )?;
        let stream_releases_total = IntCounter::new(
            "image_variations_camera_releases_total",
            "Camera streams released",
        )?;
        let stream_failures_total = IntCounter::new(
            "image_variations_camera_failures_total",
            "Camera acquisitions that failed",
        )?;
        let active_streams = IntGauge::new(
            "image_variations_camera_active_streams",
            "Camera streams currently held",
        )?;

        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(processing_failures_total.clone()))?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_failures_total.clone()))?;
        registry.register(Box::new(variations_received_total.clone()))?;
        registry.register(Box::new(loading.clone()))?;
        registry.register(Box::new(stream_acquisitions_total.clone()))?;
        registry.register(Box::new(stream_releases_total.clone()))?;
        registry.register(Box::new(stream_failures_total.clone()))?;
        registry.register(Box::new(active_streams.clone()))?;

        Ok(Self {
            registry,
            uploads_total,
            captures_total,
            processing_failures_total,
            requests_total,
            request_failures_total,
            variations_received_total,
            loading,
            stream_acquisitions_total,
            stream_releases_total,
            stream_failures_total,
            active_streams,
        })
    }

    /// Updates all metrics from a snapshot of session state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        advance(&self.uploads_total, snapshot.uploads);
        advance(&self.captures_total, snapshot.captures);
        advance(&self.processing_failures_total, snapshot.processing_failures);

        advance(&self.requests_total, snapshot.requests);
        advance(&self.request_failures_total, snapshot.request_failures);
        advance(&self.variations_received_total, snapshot.variations_received);
        self.loading.set(i64::from(snapshot.loading));

        advance(&self.stream_acquisitions_total, snapshot.stream_acquisitions);
        advance(&self.stream_releases_total, snapshot.stream_releases);
        advance(&self.stream_failures_total, snapshot.stream_failures);
        self.active_streams.set(
            snapshot
                .stream_acquisitions
                .saturating_sub(snapshot.stream_releases) as i64,
        );
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of session components.
    pub fn from_components(tool: &ToolStats, loading: bool, streams: &StreamStats) -> Self {
        Self {
            uploads: tool.uploads,
            captures: tool.captures,
            processing_failures: tool.processing_failures,
            requests: tool.requests,
            request_failures: tool.request_failures,
            variations_received: tool.variations_received,
            loading,
            stream_acquisitions: streams.acquisitions,
            stream_releases: streams.releases,
            stream_failures: streams.failed_acquisitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let tool = ToolStats {
            uploads: 2,
            requests: 3,
            request_failures: 1,
            variations_received: 8,
            ..Default::default()
        };
        let streams = StreamStats {
            acquisitions: 3,
            releases: 2,
            ..Default::default()
        };

        registry.update(&MetricsSnapshot::from_components(&tool, true, &streams));

        let output = registry.encode().unwrap();
        assert!(output.contains("image_variations_uploads_total 2"));
        assert!(output.contains("image_variations_received_total 8"));
        assert!(output.contains("image_variations_loading 1"));
        assert!(output.contains("image_variations_camera_active_streams 1"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot {
            requests: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            requests: 2,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("image_variations_requests_total 5"));
    }
}
