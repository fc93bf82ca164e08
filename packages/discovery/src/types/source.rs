//! Domain types for discovered sources and their ingestion strategies.

use serde::{Deserialize, Serialize};

/// How a source's data should be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMethod {
    /// File can be fetched directly (csv, json, archives)
    DirectDownload,

    /// Data is served by an API endpoint
    Api,

    /// Data is embedded in pages and must be crawled
    WebCrawl,

    /// User-supplied local file
    LocalFile,
}

impl AccessMethod {
    /// Wire name as sent to and received from the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectDownload => "DIRECT_DOWNLOAD",
            Self::Api => "API",
            Self::WebCrawl => "WEB_CRAWL",
            Self::LocalFile => "LOCAL_FILE",
        }
    }

    /// Parse a model-reported method name. Unknown names map to `WebCrawl`,
    /// the safe default for anything we cannot classify.
    pub fn from_model_output(value: &str) -> Self {
        match value.trim() {
            "DIRECT_DOWNLOAD" => Self::DirectDownload,
            "API" => Self::Api,
            "LOCAL_FILE" => Self::LocalFile,
            _ => Self::WebCrawl,
        }
    }
}

impl std::fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The synthesized ingestion approach for one source.
///
/// Every field is optional: absence of an expected field is a degraded but
/// valid state, renderable as "not provided", never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Code snippet appropriate to the access method (curl, fetch, python)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Stringified field-name/type description of the expected data shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Stringified crawl configuration, meaningful for `WEB_CRAWL` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Model-reported confidence, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,

    /// Model-reported reason for the confidence score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_reason: Option<String>,
}

impl Strategy {
    /// Serialized form used as refinement context.
    pub fn to_context_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// One candidate data source produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredSource {
    /// URL or local filename identifying the source
    pub locator: String,

    /// Immutable once set by analysis (or fixed to `LocalFile` for uploads)
    pub access_method: AccessMethod,

    /// Human-readable rationale for the classification
    pub justification: String,

    /// Classification confidence, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,

    /// The ingestion approach. Replaced wholesale when regenerated.
    pub strategy: Strategy,

    /// Markdown cleaning plan, set only after a refinement request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_strategy: Option<String>,
}

impl DiscoveredSource {
    /// Create a source with no strategy yet.
    pub fn new(locator: impl Into<String>, access_method: AccessMethod) -> Self {
        Self {
            locator: locator.into(),
            access_method,
            justification: String::new(),
            confidence: None,
            strategy: Strategy::default(),
            cleaning_strategy: None,
        }
    }

    /// Set the justification.
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = justification.into();
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Produce the refined replacement for this source.
    ///
    /// Returns a new record rather than mutating in place so observers never
    /// see a half-updated source.
    pub fn refined(&self, cleaning_strategy: impl Into<String>) -> Self {
        let mut replacement = self.clone();
        replacement.cleaning_strategy = Some(cleaning_strategy.into());
        replacement
    }
}
