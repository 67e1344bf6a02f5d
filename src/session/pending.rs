//! In-flight variation requests.

use crate::source::SourceImage;
use crate::variation::{VariationApi, VariationClient, VariationError, VariationResult};
use std::sync::Arc;

/// A variation request that has been admitted but not yet sent.
///
/// Holds its own handle on the source image, so selecting a new source
/// while the request runs does not change what is submitted.
pub struct PendingGeneration<A> {
    pub(super) ticket: u64,
    pub(super) image: SourceImage,
    pub(super) client: Arc<VariationClient<A>>,
}

impl<A: VariationApi> PendingGeneration<A> {
    /// Ticket identifying this request.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Performs the request. Hand the outcome back to the tool with
    /// [`VariationTool::finish_generate`](super::VariationTool::finish_generate).
    pub async fn run(self) -> GenerationOutcome {
        let result = self.client.submit(&self.image).await;
        GenerationOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// Result of a [`PendingGeneration`], tagged with its ticket.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub(super) ticket: u64,
    pub(super) result: Result<VariationResult, VariationError>,
}

impl GenerationOutcome {
    /// Ticket of the request that produced this outcome.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Whether variations were received.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// What a generate call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateStatus {
    /// No source image is selected; nothing happened.
    NoSource,
    /// Variations were received and now replace the previous set.
    Completed {
        /// Number of images received.
        count: usize,
    },
    /// The request was cancelled or superseded; its outcome was discarded.
    Stale,
}
