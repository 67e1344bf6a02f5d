//! Remote image-variation requests.
//!
//! [`VariationApi`] is the transport seam; [`OpenAiImages`] implements it
//! over HTTP and tests substitute an in-memory fake. [`VariationClient`]
//! layers the credential pre-check, result filtering and failure
//! classification on top of any transport.

mod api;
mod client;
mod credential;
mod openai;

pub use api::{ApiFailure, VariationApi, VariationEntry, VariationRequest, VariationResponse};
pub use client::{
    VariationClient, VariationError, VariationImage, VariationResult, DEFAULT_VARIATION_COUNT,
};
pub use credential::ApiCredential;
pub use openai::OpenAiImages;
