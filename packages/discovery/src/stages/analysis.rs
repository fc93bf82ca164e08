//! Analysis stage: classify one locator by access method.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use genai_client::StructuredOutput;

use crate::prompts::format_analysis_prompt;
use crate::traits::{analyzer::UrlAnalyzer, generator::TextGenerator};
use crate::types::source::AccessMethod;
use crate::validator::validate_and_repair;

/// Classification result for one locator.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// How the data should be retrieved
    pub access_method: AccessMethod,

    /// The actual data URL or endpoint (may equal the analyzed locator)
    pub target: String,

    /// One-sentence rationale
    pub justification: String,

    /// Classification confidence, 0-100
    pub confidence: u8,
}

impl Analysis {
    /// The low-confidence fallback used when analysis fails for a locator.
    pub fn crawl_fallback(locator: &str) -> Self {
        Self {
            access_method: AccessMethod::WebCrawl,
            target: locator.to_string(),
            justification: "Automatic analysis failed. Defaulting to standard crawl.".to_string(),
            confidence: 20,
        }
    }
}

/// Wire shape of the model's classification response.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    access_method: String,
    target: Option<String>,
    justification: String,
    confidence: Option<u8>,
}

/// Classifies a locator into an access method using fetched metadata plus
/// model reasoning. Never fails: every error path degrades to a
/// low-confidence crawl classification.
pub struct AnalysisStage<G, A> {
    generator: G,
    analyzer: A,
}

impl<G: TextGenerator, A: UrlAnalyzer> AnalysisStage<G, A> {
    /// Create a new analysis stage.
    pub fn new(generator: G, analyzer: A) -> Self {
        Self {
            generator,
            analyzer,
        }
    }

    /// Classify one locator.
    ///
    /// Classification is a pure function of the analyzer metadata and the
    /// generator output: deterministic collaborators give deterministic
    /// results.
    pub async fn analyze(&self, locator: &str) -> Analysis {
        let metadata = match self.analyzer.analyze(locator).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(url = %locator, error = %e, "metadata fetch failed, defaulting to crawl");
                return Analysis::crawl_fallback(locator);
            }
        };

        let prompt = format_analysis_prompt(&metadata);
        let raw = match self
            .generator
            .generate_json(&prompt, Some(AnalysisResponse::response_schema()))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(url = %locator, error = %e, "classification failed, defaulting to crawl");
                return Analysis::crawl_fallback(locator);
            }
        };

        let repaired = validate_and_repair(
            &self.generator,
            &format!("Determine access method for URL: {locator}"),
            &raw,
            &["accessMethod", "target", "justification", "confidence"],
            || AnalysisResponse {
                access_method: "WEB_CRAWL".to_string(),
                target: Some(locator.to_string()),
                justification: "Fallback to web crawl due to validation error".to_string(),
                confidence: Some(20),
            },
        )
        .await;

        let response = repaired.value;
        // LOCAL_FILE is reserved for uploads; a URL classified that way
        // degrades to a crawl like any other unusable classification.
        let access_method = match AccessMethod::from_model_output(&response.access_method) {
            AccessMethod::LocalFile => AccessMethod::WebCrawl,
            method => method,
        };
        Analysis {
            access_method,
            target: response
                .target
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| locator.to_string()),
            justification: response.justification,
            confidence: response.confidence.unwrap_or(50).min(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGenerator;
    use crate::traits::analyzer::{MockUrlAnalyzer, UrlMetadata};

    const CSV_URL: &str = "https://example.com/data.csv";

    fn csv_metadata() -> UrlMetadata {
        UrlMetadata::new(CSV_URL)
            .with_content_type("text/csv")
            .with_snippet("city,temp\nOslo,4")
            .downloadable()
    }

    #[tokio::test]
    async fn test_classifies_from_model_response() {
        let generator = MockGenerator::new().with_response(
            r#"{"accessMethod": "DIRECT_DOWNLOAD", "target": "https://example.com/data.csv",
                "justification": "URL ends in .csv and serves text/csv", "confidence": 95}"#,
        );
        let analyzer = MockUrlAnalyzer::new().with_metadata(csv_metadata());

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze(CSV_URL).await;

        assert_eq!(analysis.access_method, AccessMethod::DirectDownload);
        assert_eq!(analysis.target, CSV_URL);
        assert_eq!(analysis.confidence, 95);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_crawl() {
        let generator = MockGenerator::new();
        let analyzer = MockUrlAnalyzer::new().failing();

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze("https://down.example/page").await;

        assert_eq!(analysis.access_method, AccessMethod::WebCrawl);
        assert_eq!(analysis.target, "https://down.example/page");
        assert!(analysis.confidence <= 30);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_crawl() {
        let generator = MockGenerator::new().failing();
        let analyzer = MockUrlAnalyzer::new().with_metadata(csv_metadata());

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze(CSV_URL).await;

        assert_eq!(analysis, Analysis::crawl_fallback(CSV_URL));
    }

    #[tokio::test]
    async fn test_unknown_method_maps_to_crawl() {
        let generator = MockGenerator::new().with_response(
            r#"{"accessMethod": "CARRIER_PIGEON", "target": "https://example.com/page",
                "justification": "who knows", "confidence": 40}"#,
        );
        let analyzer = MockUrlAnalyzer::new();

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze("https://example.com/page").await;

        assert_eq!(analysis.access_method, AccessMethod::WebCrawl);
    }

    #[tokio::test]
    async fn test_local_file_classification_degrades_to_crawl() {
        // Only uploads may be LOCAL_FILE; a URL classified that way must
        // come out as a crawl so strategy synthesis can proceed.
        let generator = MockGenerator::new().with_response(
            r#"{"accessMethod": "LOCAL_FILE", "target": "https://example.com/page",
                "justification": "looks like a file", "confidence": 60}"#,
        );
        let analyzer = MockUrlAnalyzer::new();

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze("https://example.com/page").await;

        assert_eq!(analysis.access_method, AccessMethod::WebCrawl);
    }

    #[tokio::test]
    async fn test_missing_target_replaced_by_locator() {
        let generator = MockGenerator::new()
            // Malformed first answer, repaired version still missing target
            .with_response(
                r#"{"accessMethod": "API", "target": "", "justification": "api docs", "confidence": 80}"#,
            );
        let analyzer = MockUrlAnalyzer::new();

        let stage = AnalysisStage::new(generator, analyzer);
        let analysis = stage.analyze("https://example.com/api/things").await;

        assert_eq!(analysis.access_method, AccessMethod::Api);
        assert_eq!(analysis.target, "https://example.com/api/things");
    }

    #[tokio::test]
    async fn test_analysis_is_idempotent_with_deterministic_stubs() {
        let response = r#"{"accessMethod": "DIRECT_DOWNLOAD", "target": "https://example.com/data.csv",
            "justification": "csv", "confidence": 95}"#;
        let generator = MockGenerator::new().with_response(response);
        let analyzer = MockUrlAnalyzer::new().with_metadata(csv_metadata());

        let stage = AnalysisStage::new(generator, analyzer);
        let first = stage.analyze(CSV_URL).await;
        let second = stage.analyze(CSV_URL).await;

        assert_eq!(first, second);
    }
}
