//! Variation request client.
//!
//! Validates the credential locally, submits a single request, drops
//! entries without a usable reference and classifies failures.

use super::api::{ApiFailure, VariationApi, VariationEntry, VariationRequest};
use super::ApiCredential;
use crate::source::SourceImage;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

/// Variations requested per call.
pub const DEFAULT_VARIATION_COUNT: u32 = 4;

/// Errors surfaced by a variation request.
#[derive(Debug, Clone, Error)]
pub enum VariationError {
    /// No valid credential is configured.
    #[error("API credential missing or malformed")]
    MissingCredential,
    /// The service rejected the credential (HTTP 401).
    #[error("API rejected the credential")]
    Unauthorized,
    /// The service is rate limiting (HTTP 429).
    #[error("API rate limit exceeded")]
    RateLimited,
    /// The response held no usable image reference.
    #[error("API returned no usable images")]
    EmptyResult,
    /// Any other failure.
    #[error("variation request failed: {}", .message.as_deref().unwrap_or("unknown error"))]
    Other {
        /// HTTP status, if one was received.
        status: Option<u16>,
        /// Message reported by the service.
        message: Option<String>,
    },
}

impl VariationError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            VariationError::MissingCredential => {
                "Please configure your OpenAI API key before generating variations.".to_string()
            }
            VariationError::Unauthorized => {
                "Invalid API key. Please check your OpenAI API key configuration.".to_string()
            }
            VariationError::RateLimited => {
                "Rate limit exceeded. Please try again later.".to_string()
            }
            VariationError::EmptyResult => {
                "No variations were generated. Please try again.".to_string()
            }
            VariationError::Other {
                message: Some(message),
                ..
            } => message.clone(),
            VariationError::Other { message: None, .. } => {
                "Error generating variations. Please try again.".to_string()
            }
        }
    }
}

impl From<ApiFailure> for VariationError {
    fn from(failure: ApiFailure) -> Self {
        match failure.status {
            Some(401) => VariationError::Unauthorized,
            Some(429) => VariationError::RateLimited,
            status => VariationError::Other {
                status,
                message: failure.message.filter(|m| !m.trim().is_empty()),
            },
        }
    }
}

/// Reference to one generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariationImage {
    /// Hosted image URL.
    Url(String),
    /// Base64-encoded PNG returned inline.
    Inline(String),
}

impl VariationImage {
    fn from_entry(entry: VariationEntry) -> Option<Self> {
        let usable = |s: &String| !s.trim().is_empty();
        match (entry.url, entry.b64_json) {
            (Some(url), _) if usable(&url) => Some(VariationImage::Url(url)),
            (_, Some(data)) if usable(&data) => Some(VariationImage::Inline(data)),
            _ => None,
        }
    }

    /// Display reference: the URL, or a `data:` URL for inline images.
    pub fn reference(&self) -> String {
        match self {
            VariationImage::Url(url) => url.clone(),
            VariationImage::Inline(data) => format!("data:image/png;base64,{data}"),
        }
    }
}

/// Ordered, non-empty set of generated images from one request.
#[derive(Debug, Clone)]
pub struct VariationResult {
    images: Vec<VariationImage>,
    created_at: DateTime<Utc>,
}

impl VariationResult {
    /// Images in response order.
    pub fn images(&self) -> &[VariationImage] {
        &self.images
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false for results returned by the client.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Creation time reported by the service, or receipt time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display references in response order.
    pub fn references(&self) -> Vec<String> {
        self.images.iter().map(VariationImage::reference).collect()
    }
}

/// Submits normalized images to a [`VariationApi`].
pub struct VariationClient<A> {
    api: A,
    credential: ApiCredential,
    count: u32,
    size: String,
}

impl<A: VariationApi> VariationClient<A> {
    /// Creates a client requesting `DEFAULT_VARIATION_COUNT` images of `size`.
    pub fn new(api: A, credential: ApiCredential, size: impl Into<String>) -> Self {
        Self {
            api,
            credential,
            count: DEFAULT_VARIATION_COUNT,
            size: size.into(),
        }
    }

    /// Sets the number of variations requested (at least 1).
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// Syntactic credential check; no network involved.
    pub fn has_valid_credential(&self) -> bool {
        self.credential.is_valid()
    }

    /// The underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Requests variations of `image`. One attempt, no retry.
    pub async fn submit(&self, image: &SourceImage) -> Result<VariationResult, VariationError> {
        if !self.credential.is_valid() {
            tracing::warn!("Variation request blocked: credential invalid");
            return Err(VariationError::MissingCredential);
        }

        let request = VariationRequest {
            image: image.shared_png(),
            count: self.count,
            size: self.size.clone(),
        };

        tracing::info!(
            source = %image.origin(),
            count = self.count,
            size = %self.size,
            "Requesting variations"
        );

        let response = match self.api.create_variation(&self.credential, request).await {
            Ok(response) => response,
            Err(failure) => {
                tracing::warn!(status = ?failure.status, error = %failure, "Variation request failed");
                return Err(failure.into());
            }
        };

        let returned = response.data.len();
        let images: Vec<VariationImage> = response
            .data
            .into_iter()
            .filter_map(VariationImage::from_entry)
            .collect();

        if images.is_empty() {
            tracing::warn!(returned, "Variation response had no usable images");
            return Err(VariationError::EmptyResult);
        }
        if images.len() < returned {
            tracing::debug!(
                returned,
                usable = images.len(),
                "Dropped variation entries without a reference"
            );
        }

        let created_at = response
            .created
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        tracing::info!(count = images.len(), "Received variations");
        Ok(VariationResult { images, created_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{source, urls, FakeApi, GOOD_KEY};
    use crate::variation::VariationResponse;

    fn client(api: FakeApi, key: &str) -> VariationClient<FakeApi> {
        VariationClient::new(api, ApiCredential::new(key), "1024x1024")
    }

    #[tokio::test]
    async fn test_invalid_credential_skips_network() {
        let client = client(FakeApi::replying(Ok(urls(&["https://x/1"]))), "nope");
        let result = client.submit(&source()).await;

        assert!(matches!(result, Err(VariationError::MissingCredential)));
        assert_eq!(client.api().calls(), 0);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = client(FakeApi::replying(Ok(urls(&["https://x/1"]))), GOOD_KEY);
        client.submit(&source()).await.unwrap();

        let request = client.api().last_request().unwrap();
        assert_eq!(request.count, 4);
        assert_eq!(request.size, "1024x1024");
        assert_eq!(&request.image[..], source().png());
    }

    #[tokio::test]
    async fn test_entries_without_reference_filtered() {
        let response = VariationResponse {
            created: None,
            data: vec![
                VariationEntry {
                    url: Some("https://x/1".into()),
                    b64_json: None,
                },
                VariationEntry::default(),
                VariationEntry {
                    url: Some(String::new()),
                    b64_json: Some("QUJD".into()),
                },
            ],
        };
        let client = client(FakeApi::replying(Ok(response)), GOOD_KEY);
        let result = client.submit(&source()).await.unwrap();

        assert_eq!(
            result.references(),
            vec![
                "https://x/1".to_string(),
                "data:image/png;base64,QUJD".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_all_filtered_is_empty_result() {
        let response = VariationResponse {
            created: None,
            data: vec![VariationEntry::default(), VariationEntry::default()],
        };
        let client = client(FakeApi::replying(Ok(response)), GOOD_KEY);
        assert!(matches!(
            client.submit(&source()).await,
            Err(VariationError::EmptyResult)
        ));
    }

    #[tokio::test]
    async fn test_fewer_than_requested_is_fine() {
        let client = client(FakeApi::replying(Ok(urls(&["https://x/1", "https://x/2"]))), GOOD_KEY);
        let result = client.submit(&source()).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.created_at().timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let cases = [
            (ApiFailure::status(401, None), "Invalid API key"),
            (ApiFailure::status(429, Some("slow down".into())), "Rate limit"),
            (ApiFailure::status(400, Some("Image too large".into())), "Image too large"),
            (ApiFailure::status(500, None), "Error generating variations"),
            (ApiFailure::transport("connection refused"), "connection refused"),
        ];

        for (failure, expected) in cases {
            let client = client(FakeApi::replying(Err(failure)), GOOD_KEY);
            let err = client.submit(&source()).await.unwrap_err();
            assert!(
                err.user_message().contains(expected),
                "{err:?} -> {}",
                err.user_message()
            );
            assert_eq!(client.api().calls(), 1);
        }
    }
}
