//! Text generation trait.
//!
//! Abstracts the hosted model so stages can be tested with deterministic
//! stubs instead of patching a shared client. The trait does not retry;
//! retry and repair policy lives in the validator and the planner.

use async_trait::async_trait;

use crate::error::Result;

/// Text generation capability consumed by every pipeline stage.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free-form text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate JSON text, optionally constrained by a response schema.
    ///
    /// The returned string is raw model output and may still be malformed;
    /// callers pass it through the validator.
    async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<serde_json::Value>,
    ) -> Result<String>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<serde_json::Value>,
    ) -> Result<String> {
        (**self).generate_json(prompt, schema).await
    }
}

#[async_trait]
impl TextGenerator for genai_client::GenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(genai_client::GenAiClient::generate(self, prompt).await?)
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: Option<serde_json::Value>,
    ) -> Result<String> {
        Ok(genai_client::GenAiClient::generate_json(self, prompt, schema).await?)
    }
}
