//! Testing utilities including mock implementations.
//!
//! Useful for testing applications that use the discovery pipeline without
//! making real model or network calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::RwLock;

use crate::error::{DiscoveryError, Result};
use crate::traits::generator::TextGenerator;

/// Record of one call made to the mock generator.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The full prompt text
    pub prompt: String,

    /// Whether a JSON-constrained response was requested
    pub structured: bool,
}

/// A mock text generator with scripted responses and call tracking.
///
/// Responses are matched by prompt substring first, then taken from a FIFO
/// script. The last scripted response repeats once the script is exhausted.
#[derive(Default)]
pub struct MockGenerator {
    by_substring: RwLock<Vec<(String, String)>>,
    script: RwLock<VecDeque<String>>,
    last: RwLock<Option<String>>,
    fail: std::sync::atomic::AtomicBool,
    calls: RwLock<Vec<RecordedCall>>,
}

impl MockGenerator {
    /// Create a new mock generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(response.into());
        self
    }

    /// Respond with `response` whenever the prompt contains `substring`.
    ///
    /// Substring rules win over the FIFO script.
    pub fn with_response_for(self, substring: impl Into<String>, response: impl Into<String>) -> Self {
        self.by_substring
            .write()
            .unwrap()
            .push((substring.into(), response.into()));
        self
    }

    /// Make every generation call fail.
    pub fn failing(self) -> Self {
        self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap().clone()
    }

    fn respond(&self, prompt: &str, structured: bool) -> Result<String> {
        self.calls.write().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            structured,
        });

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DiscoveryError::Generation(genai_client::GenAiError::Network(
                "mock generation failure".to_string(),
            )));
        }

        for (substring, response) in self.by_substring.read().unwrap().iter() {
            if prompt.contains(substring) {
                return Ok(response.clone());
            }
        }

        if let Some(next) = self.script.write().unwrap().pop_front() {
            *self.last.write().unwrap() = Some(next.clone());
            return Ok(next);
        }

        if let Some(last) = self.last.read().unwrap().clone() {
            return Ok(last);
        }

        Err(DiscoveryError::Generation(genai_client::GenAiError::Api(
            "mock: no scripted response".to_string(),
        )))
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.respond(prompt, false)
    }

    async fn generate_json(
        &self,
        prompt: &str,
        _schema: Option<serde_json::Value>,
    ) -> Result<String> {
        self.respond(prompt, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_order_and_repeat() {
        let generator = MockGenerator::new()
            .with_response("first")
            .with_response("second");

        assert_eq!(generator.generate("a").await.unwrap(), "first");
        assert_eq!(generator.generate("b").await.unwrap(), "second");
        // Exhausted script repeats the last response
        assert_eq!(generator.generate("c").await.unwrap(), "second");
        assert_eq!(generator.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_substring_rules_win() {
        let generator = MockGenerator::new()
            .with_response("scripted")
            .with_response_for("search query", "optimized query");

        assert_eq!(
            generator.generate("produce a search query").await.unwrap(),
            "optimized query"
        );
        assert_eq!(generator.generate("other").await.unwrap(), "scripted");
    }

    #[tokio::test]
    async fn test_unscripted_call_errors() {
        let generator = MockGenerator::new();
        assert!(generator.generate("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_structured_flag_recorded() {
        let generator = MockGenerator::new().with_response("{}");
        generator.generate_json("p", None).await.unwrap();
        assert!(generator.calls()[0].structured);
    }
}
