//! Wire contract of the remote image-variation service.

use super::ApiCredential;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// One variation request.
#[derive(Clone)]
pub struct VariationRequest {
    /// PNG-encoded square source image.
    pub image: Arc<[u8]>,
    /// Number of variations to generate.
    pub count: u32,
    /// Output size, formatted `WxH`.
    pub size: String,
}

impl std::fmt::Debug for VariationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariationRequest")
            .field("image_bytes", &self.image.len())
            .field("count", &self.count)
            .field("size", &self.size)
            .finish()
    }
}

/// A successful response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariationResponse {
    /// Unix timestamp of generation, if reported.
    #[serde(default)]
    pub created: Option<i64>,
    /// Generated images, in order.
    #[serde(default)]
    pub data: Vec<VariationEntry>,
}

/// One generated image, referenced by URL or inline base64 data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariationEntry {
    /// Hosted image URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Base64-encoded image data.
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// A failed remote call.
///
/// `status` is absent when the request never produced an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("variation API failure (status {:?}): {}", .status, .message.as_deref().unwrap_or("no message"))]
pub struct ApiFailure {
    /// HTTP status, or `None` for transport failures.
    pub status: Option<u16>,
    /// Error message reported by the service.
    pub message: Option<String>,
}

impl ApiFailure {
    /// A non-success HTTP response.
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message,
        }
    }

    /// A failure before any HTTP status was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
        }
    }
}

/// Transport seam for the remote service.
///
/// Implementations perform exactly one attempt per call.
#[async_trait]
pub trait VariationApi: Send + Sync {
    /// Sends one variation request authenticated with `credential`.
    async fn create_variation(
        &self,
        credential: &ApiCredential,
        request: VariationRequest,
    ) -> Result<VariationResponse, ApiFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_response() {
        let body = r#"{
            "created": 1700000000,
            "data": [
                {"url": "https://example.com/a.png"},
                {"b64_json": "iVBORw0KGgo="},
                {"revised_prompt": "ignored"}
            ]
        }"#;
        let response: VariationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.created, Some(1700000000));
        assert_eq!(response.data.len(), 3);
        assert!(response.data[2].url.is_none());
    }

    #[test]
    fn test_parse_missing_data() {
        let response: VariationResponse = serde_json::from_str("{}").unwrap();
        assert!(response.data.is_empty());
    }
}
