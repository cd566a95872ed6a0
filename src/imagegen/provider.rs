//! HTTP client for the images API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde_json::Value;

use super::{GenerateError, ImageApiConfig};

/// Timeout for establishing a connection (30 seconds).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the entire request including response (120 seconds).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Anything that can turn a prompt into encoded image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates one image for `prompt` and returns its raw bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerateError>;

    /// Model name, for logging.
    fn model(&self) -> &str;
}

/// OpenAI-compatible `images/generations` client.
pub struct OpenAiImageProvider {
    /// HTTP client instance.
    client: Client,
    config: ImageApiConfig,
}

impl OpenAiImageProvider {
    pub fn new(client: Client, config: ImageApiConfig) -> Self {
        Self { client, config }
    }

    /// Builds the JSON request body for the images API.
    fn build_request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "size": self.config.size.to_string(),
            "response_format": "b64_json",
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerateError::NotConfigured)?;

        let body = self.build_request_body(prompt);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerateError::HttpError {
                status: status_code,
                body: body_text,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GenerateError::ParseError(e.to_string()))?;

        decode_image_response(&json)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Extracts and decodes `data[0].b64_json` from an images API response.
pub fn decode_image_response(json: &Value) -> Result<Vec<u8>, GenerateError> {
    let first = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|arr| arr.first())
        .ok_or(GenerateError::NoImageData)?;

    let encoded = first
        .get("b64_json")
        .and_then(|b| b.as_str())
        .filter(|b| !b.is_empty())
        .ok_or(GenerateError::MissingPayload)?;

    BASE64
        .decode(encoded.trim())
        .map_err(|e| GenerateError::DecodeError(e.to_string()))
}

/// Creates the images API provider.
pub fn create_provider(config: ImageApiConfig) -> Result<Arc<dyn ImageProvider>, GenerateError> {
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| GenerateError::RequestFailed(format!("Failed to build HTTP client: {e}")))?;

    Ok(Arc::new(OpenAiImageProvider::new(client, config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider(api_key: Option<&str>) -> OpenAiImageProvider {
        let config = ImageApiConfig {
            api_key: api_key.map(String::from),
            model: "test-model".to_string(),
            size: "512x256".parse().unwrap(),
            ..ImageApiConfig::default()
        };
        OpenAiImageProvider::new(Client::new(), config)
    }

    #[test]
    fn test_request_body_shape() {
        let provider = test_provider(Some("sk-test"));
        let body = provider.build_request_body("a possum fishing");

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["prompt"], "a possum fishing");
        assert_eq!(body["size"], "512x256");
        assert_eq!(body["response_format"], "b64_json");
    }

    #[tokio::test]
    async fn test_generate_without_key_is_not_configured() {
        for key in [None, Some("")] {
            let provider = test_provider(key);
            match provider.generate("anything").await {
                Err(GenerateError::NotConfigured) => {}
                other => panic!("Expected NotConfigured, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_image_response_ok() {
        let json = serde_json::json!({
            "created": 1,
            "data": [{ "b64_json": BASE64.encode(b"not really a png") }]
        });
        assert_eq!(decode_image_response(&json).unwrap(), b"not really a png");
    }

    #[test]
    fn test_decode_image_response_no_data() {
        for json in [serde_json::json!({}), serde_json::json!({ "data": [] })] {
            match decode_image_response(&json) {
                Err(GenerateError::NoImageData) => {}
                other => panic!("Expected NoImageData, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_image_response_missing_payload() {
        let json = serde_json::json!({ "data": [{ "url": "https://example.com/x.png" }] });
        match decode_image_response(&json) {
            Err(GenerateError::MissingPayload) => {}
            other => panic!("Expected MissingPayload, got: {other:?}"),
        }
    }

    #[test]
    fn test_decode_image_response_bad_base64() {
        let json = serde_json::json!({ "data": [{ "b64_json": "%%%not base64%%%" }] });
        match decode_image_response(&json) {
            Err(GenerateError::DecodeError(_)) => {}
            other => panic!("Expected DecodeError, got: {other:?}"),
        }
    }
}
