//! Session orchestration.
//!
//! [`VariationTool`] coordinates the other components for one session:
//! uploads go through the normalizer, captures arrive already normalized
//! from the camera controller, and generate calls go through the
//! variation client.
//!
//! Generation is split into admit → run → apply so the tool stays usable
//! while a request is outstanding:
//!
//! ```text
//! begin_generate() ──► PendingGeneration::run().await ──► finish_generate()
//!   (loading on)                                          (loading off)
//! ```

mod pending;
mod tool;

pub use pending::{GenerateStatus, GenerationOutcome, PendingGeneration};
pub use tool::{ToolStats, VariationTool};
