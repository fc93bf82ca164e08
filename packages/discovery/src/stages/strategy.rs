//! Strategy stage: synthesize an ingestion approach for one source.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use genai_client::StructuredOutput;

use crate::error::Result;
use crate::prompts::{format_file_strategy_prompt, format_strategy_prompt};
use crate::traits::generator::TextGenerator;
use crate::types::source::{AccessMethod, Strategy};
use crate::validator::validate_and_repair;

/// Explanatory snippet used when synthesis fails end to end.
const DEGRADED_SNIPPET: &str = "> An error occurred while generating a strategy for this source.";

/// Wire shape of the model's strategy response.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct StrategyResponse {
    snippet: Option<String>,
    schema: Option<String>,
    config: Option<String>,
    confidence: Option<u8>,
    confidence_reason: Option<String>,
}

impl StrategyResponse {
    fn degraded() -> Self {
        Self {
            snippet: Some(DEGRADED_SNIPPET.to_string()),
            schema: None,
            config: None,
            confidence: Some(0),
            confidence_reason: Some("strategy generation failed".to_string()),
        }
    }

    fn into_strategy(self) -> Strategy {
        Strategy {
            snippet: self.snippet,
            schema: self.schema,
            config: self.config,
            confidence: self.confidence.map(|c| c.min(100)),
            confidence_reason: self.confidence_reason,
        }
    }
}

/// Synthesizes an ingestion strategy per access method.
///
/// Total failure (including the repair pass) yields a degraded strategy with
/// confidence 0 rather than an error, so the pipeline keeps going.
pub struct StrategyStage<G> {
    generator: G,
}

impl<G: TextGenerator> StrategyStage<G> {
    /// Create a new strategy stage.
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Synthesize a strategy for a URL-based source.
    ///
    /// Fails fast for `LOCAL_FILE` (a caller bug); use
    /// [`synthesize_for_file`](Self::synthesize_for_file) for uploads.
    pub async fn synthesize(&self, method: AccessMethod, target: &str) -> Result<Strategy> {
        let prompt = format_strategy_prompt(method, target)?;
        Ok(self
            .generate_validated(&prompt, &format!("ingestion strategy for {target}"))
            .await)
    }

    /// Synthesize a strategy for an uploaded file from a content sample.
    pub async fn synthesize_for_file(&self, file_name: &str, content_sample: &str) -> Strategy {
        let prompt = format_file_strategy_prompt(file_name, content_sample);
        self.generate_validated(&prompt, &format!("ingestion strategy for file {file_name}"))
            .await
    }

    async fn generate_validated(&self, prompt: &str, task: &str) -> Strategy {
        let raw = match self
            .generator
            .generate_json(prompt, Some(StrategyResponse::response_schema()))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(task = task, error = %e, "strategy generation failed");
                return StrategyResponse::degraded().into_strategy();
            }
        };

        let repaired = validate_and_repair(
            &self.generator,
            task,
            &raw,
            &["confidence"],
            StrategyResponse::degraded,
        )
        .await;

        let mut strategy = repaired.value.into_strategy();
        if repaired.was_repaired {
            if let Some(note) = repaired.repair_note {
                strategy.confidence_reason = Some(match strategy.confidence_reason {
                    Some(reason) => format!("[Fixed] {note}; {reason}"),
                    None => format!("[Fixed] {note}"),
                });
            }
        }
        strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::testing::MockGenerator;

    #[tokio::test]
    async fn test_download_strategy() {
        let generator = MockGenerator::new().with_response(
            r#"{"snippet": "curl -O https://example.com/data.csv",
                "confidence": 90, "confidenceReason": "direct file link"}"#,
        );

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize(AccessMethod::DirectDownload, "https://example.com/data.csv")
            .await
            .unwrap();

        assert_eq!(
            strategy.snippet.as_deref(),
            Some("curl -O https://example.com/data.csv")
        );
        assert_eq!(strategy.confidence, Some(90));
        assert!(strategy.config.is_none());
    }

    #[tokio::test]
    async fn test_crawl_strategy_carries_config_and_schema() {
        let generator = MockGenerator::new().with_response(
            r#"{"config": "{\"url\": \"https://example.com\", \"maxDepth\": 2}",
                "schema": "{\"temperature\": \"number\"}",
                "confidence": 60, "confidenceReason": "HTML tables"}"#,
        );

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize(AccessMethod::WebCrawl, "https://example.com")
            .await
            .unwrap();

        assert!(strategy.config.as_deref().unwrap().contains("maxDepth"));
        assert!(strategy.schema.is_some());
    }

    #[tokio::test]
    async fn test_local_file_method_is_a_contract_violation() {
        let generator = MockGenerator::new();
        let stage = StrategyStage::new(generator);

        let err = stage
            .synthesize(AccessMethod::LocalFile, "data.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoStrategyTemplate { .. }));
    }

    #[tokio::test]
    async fn test_file_strategy() {
        let generator = MockGenerator::new().with_response(
            r#"{"snippet": "import pandas as pd\nprint(pd.read_csv('sales.csv').head())",
                "schema": "{\"region\": \"string\", \"total\": \"number\"}",
                "confidence": 85, "confidenceReason": "clear CSV header"}"#,
        );

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize_for_file("sales.csv", "region,total\nwest,1200")
            .await;

        assert!(strategy.snippet.as_deref().unwrap().contains("pandas"));
        assert_eq!(strategy.confidence, Some(85));
    }

    #[tokio::test]
    async fn test_total_failure_degrades_with_confidence_zero() {
        let generator = MockGenerator::new().failing();

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize(AccessMethod::Api, "https://example.com/api")
            .await
            .unwrap();

        assert_eq!(strategy.confidence, Some(0));
        assert!(strategy.snippet.as_deref().unwrap().starts_with('>'));
    }

    #[tokio::test]
    async fn test_unrepairable_output_degrades_and_notes_fix() {
        let generator = MockGenerator::new()
            .with_response("not json at all")
            .with_response("still not json");

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize(AccessMethod::Api, "https://example.com/api")
            .await
            .unwrap();

        assert_eq!(strategy.confidence, Some(0));
        assert!(strategy
            .confidence_reason
            .as_deref()
            .unwrap()
            .starts_with("[Fixed]"));
    }

    #[tokio::test]
    async fn test_repaired_output_used() {
        let generator = MockGenerator::new()
            .with_response(r#"{"snippet": "curl"#) // truncated
            .with_response(r#"{"snippet": "curl -O x", "confidence": 70, "confidenceReason": "ok"}"#);

        let stage = StrategyStage::new(generator);
        let strategy = stage
            .synthesize(AccessMethod::DirectDownload, "https://example.com/x.csv")
            .await
            .unwrap();

        assert_eq!(strategy.snippet.as_deref(), Some("curl -O x"));
        assert_eq!(strategy.confidence, Some(70));
        assert!(strategy.confidence_reason.as_deref().unwrap().contains("[Fixed]"));
    }
}
