//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Gemini `generateContent` API with no
//! domain-specific logic. Supports plain text generation and JSON-constrained
//! generation with an optional response schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use genai_client::GenAiClient;
//!
//! let client = GenAiClient::from_env()?;
//!
//! // Plain text generation
//! let text = client.generate("Summarize this dataset description").await?;
//!
//! // JSON-constrained generation
//! use genai_client::StructuredOutput;
//! let raw = client
//!     .generate_json(prompt, Some(MyResponse::response_schema()))
//!     .await?;
//! ```
//!
//! The client does not retry. Retry and repair policy belongs to the caller.

pub mod error;
pub mod schema;
pub mod types;

pub use error::{GenAiError, Result};
pub use schema::StructuredOutput;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// Default model for generation requests.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GenAiClient {
    http_client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenAiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model used for generation requests.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate free-form text for a prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(prompt);
        self.generate_content(&request).await
    }

    /// Generate a JSON response, optionally constrained by a schema.
    ///
    /// Returns the raw response text. Parsing is the caller's concern since
    /// the upstream model may still produce malformed output.
    pub async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(prompt).with_json_response(schema);
        self.generate_content(&request).await
    }

    /// Issue a raw `generateContent` request.
    pub async fn generate_content(&self, request: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, "generateContent request");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| GenAiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "generateContent failed");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GenAiError::RateLimited(body),
                _ => GenAiError::Api(format!("HTTP {status}: {body}")),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::Parse(e.to_string()))?;

        parsed
            .text()
            .ok_or_else(|| GenAiError::Parse("response contained no candidate text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_configuration() {
        let client = GenAiClient::new("test-key")
            .with_base_url("http://localhost:1234")
            .with_model("gemini-2.5-pro");

        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.model(), "gemini-2.5-pro");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(GenAiError::Network("timeout".into()).is_retryable());
        assert!(GenAiError::RateLimited("429".into()).is_retryable());
        assert!(!GenAiError::Api("400".into()).is_retryable());
        assert!(!GenAiError::Parse("bad json".into()).is_retryable());
    }
}
