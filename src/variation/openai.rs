//! HTTP transport for an OpenAI-compatible images API.

use super::api::{ApiFailure, VariationApi, VariationRequest, VariationResponse};
use super::ApiCredential;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// `multipart/form-data` client for `POST {base_url}/images/variations`.
#[derive(Debug, Clone)]
pub struct OpenAiImages {
    http: reqwest::Client,
    base_url: String,
    model: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Extracts `error.message` from an API error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.trim().is_empty())
}

impl OpenAiImages {
    /// Creates a client for the given base URL (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("image-variations/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            model: None,
        })
    }

    /// Sends an explicit model name with each request.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/images/variations", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VariationApi for OpenAiImages {
    async fn create_variation(
        &self,
        credential: &ApiCredential,
        request: VariationRequest,
    ) -> Result<VariationResponse, ApiFailure> {
        let image = Part::bytes(request.image.to_vec())
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| ApiFailure::transport(e.to_string()))?;

        let mut form = Form::new()
            .part("image", image)
            .text("n", request.count.to_string())
            .text("size", request.size.clone())
            .text("response_format", "url");
        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }

        let endpoint = self.endpoint();
        tracing::debug!(%endpoint, count = request.count, size = %request.size, "Sending variation request");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(credential.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiFailure::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Variation request rejected");
            return Err(ApiFailure::status(status.as_u16(), error_message(&body)));
        }

        response.json::<VariationResponse>().await.map_err(|e| {
            ApiFailure::status(status.as_u16(), Some(format!("malformed response: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extracted() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Incorrect API key provided")
        );
    }

    #[test]
    fn test_error_message_absent() {
        assert!(error_message("").is_none());
        assert!(error_message("<html>bad gateway</html>").is_none());
        assert!(error_message(r#"{"error": {"message": "  "}}"#).is_none());
        assert!(error_message(r#"{"error": null}"#).is_none());
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let api = OpenAiImages::new("https://api.example.com/v1/").unwrap();
        assert_eq!(api.endpoint(), "https://api.example.com/v1/images/variations");
    }
}
