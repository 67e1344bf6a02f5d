//! The variation tool's state controller.

use super::pending::{GenerateStatus, GenerationOutcome, PendingGeneration};
use crate::error::{Result, ToolError};
use crate::normalize::Normalizer;
use crate::source::{ImageOrigin, SourceImage};
use crate::variation::{VariationApi, VariationClient, VariationError, VariationResult};
use std::path::Path;
use std::sync::Arc;

/// Running counters for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolStats {
    /// Uploads normalized and selected.
    pub uploads: u64,
    /// Camera stills selected.
    pub captures: u64,
    /// Uploads that failed to read or normalize.
    pub processing_failures: u64,
    /// Variation requests admitted.
    pub requests: u64,
    /// Admitted requests that failed.
    pub request_failures: u64,
    /// Generated images received across all requests.
    pub variations_received: u64,
    /// Outcomes discarded after cancellation.
    pub stale_completions: u64,
}

/// Holds the selected source, the latest variations, the loading flag
/// and the single visible error message.
///
/// Every operation records its failure as the visible error (replacing
/// any previous one) and also returns it to the caller.
pub struct VariationTool<A> {
    client: Arc<VariationClient<A>>,
    normalizer: Normalizer,
    source: Option<SourceImage>,
    variations: Option<VariationResult>,
    in_flight: Option<u64>,
    next_ticket: u64,
    error: Option<String>,
    stats: ToolStats,
}

impl<A: VariationApi> VariationTool<A> {
    /// Creates a tool with no source, no variations and no error.
    pub fn new(client: VariationClient<A>, normalizer: Normalizer) -> Self {
        Self {
            client: Arc::new(client),
            normalizer,
            source: None,
            variations: None,
            in_flight: None,
            next_ticket: 0,
            error: None,
            stats: ToolStats::default(),
        }
    }

    /// Reads, decodes and normalizes an image file, then selects it.
    pub async fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<&SourceImage> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                self.stats.processing_failures += 1;
                return Err(self.fail(ToolError::Read {
                    path: path.to_path_buf(),
                    source,
                }));
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.upload_bytes(file_name, bytes).await
    }

    /// Normalizes raw file bytes off the async executor, then selects them.
    ///
    /// On failure the previous source stays selected.
    pub async fn upload_bytes(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<&SourceImage> {
        let file_name = file_name.into();
        let normalizer = self.normalizer.clone();
        let joined =
            tokio::task::spawn_blocking(move || normalizer.normalize_bytes(&bytes)).await;

        let normalized = match joined {
            Ok(Ok(normalized)) => normalized,
            Ok(Err(err)) => {
                self.stats.processing_failures += 1;
                return Err(self.fail(err.into()));
            }
            Err(join) => {
                self.stats.processing_failures += 1;
                return Err(self.fail(ToolError::Interrupted(join.to_string())));
            }
        };

        self.stats.uploads += 1;
        tracing::info!(%file_name, size = normalized.size, "Upload normalized");
        Ok(self.select(SourceImage::new(normalized, ImageOrigin::Upload { file_name })))
    }

    /// Selects a still produced by the camera controller.
    ///
    /// Captures are already square at the target size and are used as-is.
    pub fn accept_capture(&mut self, image: SourceImage) -> &SourceImage {
        self.stats.captures += 1;
        tracing::info!(origin = %image.origin(), "Capture selected");
        self.select(image)
    }

    /// Surfaces an error raised elsewhere (e.g. by the camera controller).
    pub fn report_error(&mut self, err: impl Into<ToolError>) {
        self.fail(err.into());
    }

    /// Hides the visible error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Admits a variation request for the current source.
    ///
    /// Returns `Ok(None)` when no source is selected. An invalid
    /// credential is reported without entering the loading state. Only one
    /// request may be in flight; a second is refused with
    /// [`ToolError::Busy`] and leaves the state untouched.
    pub fn begin_generate(&mut self) -> Result<Option<PendingGeneration<A>>> {
        let Some(image) = self.source.clone() else {
            tracing::debug!("Generate ignored, no source selected");
            return Ok(None);
        };

        if !self.client.has_valid_credential() {
            return Err(self.fail(VariationError::MissingCredential.into()));
        }

        if let Some(ticket) = self.in_flight {
            tracing::debug!(ticket, "Generate refused, request already in flight");
            return Err(ToolError::Busy);
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(ticket);
        self.error = None;
        self.stats.requests += 1;

        Ok(Some(PendingGeneration {
            ticket,
            image,
            client: Arc::clone(&self.client),
        }))
    }

    /// Applies the outcome of a request admitted by [`begin_generate`](Self::begin_generate).
    ///
    /// Loading is cleared whatever the outcome. On failure the previous
    /// variations stay visible.
    pub fn finish_generate(&mut self, outcome: GenerationOutcome) -> Result<GenerateStatus> {
        if self.in_flight != Some(outcome.ticket) {
            self.stats.stale_completions += 1;
            tracing::debug!(ticket = outcome.ticket, "Discarding stale variation outcome");
            return Ok(GenerateStatus::Stale);
        }
        self.in_flight = None;

        match outcome.result {
            Ok(result) => {
                let count = result.len();
                self.stats.variations_received += count as u64;
                self.variations = Some(result);
                self.error = None;
                Ok(GenerateStatus::Completed { count })
            }
            Err(err) => {
                self.stats.request_failures += 1;
                Err(self.fail(err.into()))
            }
        }
    }

    /// Abandons the in-flight request; its outcome will be discarded.
    pub fn cancel_generate(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::info!(ticket, "Variation request cancelled");
        }
    }

    /// Requests variations for the current source and waits for them.
    pub async fn generate(&mut self) -> Result<GenerateStatus> {
        let Some(pending) = self.begin_generate()? else {
            return Ok(GenerateStatus::NoSource);
        };
        let outcome = pending.run().await;
        self.finish_generate(outcome)
    }

    /// The selected source image, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Latest successful variations, if any.
    pub fn variations(&self) -> Option<&VariationResult> {
        self.variations.as_ref()
    }

    /// Whether a variation request is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The visible error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Session counters.
    pub fn stats(&self) -> ToolStats {
        self.stats
    }

    /// The variation client.
    pub fn client(&self) -> &VariationClient<A> {
        &self.client
    }

    fn select(&mut self, image: SourceImage) -> &SourceImage {
        self.error = None;
        self.source.insert(image)
    }

    fn fail(&mut self, err: ToolError) -> ToolError {
        tracing::warn!(error = %err, "Operation failed");
        self.error = Some(err.user_message());
        err
    }
}
