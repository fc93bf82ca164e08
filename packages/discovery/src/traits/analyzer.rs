//! URL analyzer trait for metadata-driven classification.
//!
//! The analysis stage needs real signals about a URL before asking the model
//! to classify it: status, content type, a content snippet, and whether the
//! URL looks directly downloadable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DiscoveryError, Result};

/// File extensions that signal a directly downloadable data file.
pub const DOWNLOADABLE_EXTENSIONS: &[&str] = &[
    ".csv", ".json", ".xlsx", ".zip", ".parquet", ".xml", ".gz", ".h5",
];

/// Maximum characters kept from a text response body.
pub const SNIPPET_LIMIT: usize = 2000;

/// Fetched metadata about one URL.
#[derive(Debug, Clone)]
pub struct UrlMetadata {
    /// The analyzed URL
    pub url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, or "unknown"
    pub content_type: String,

    /// Content-Length header value, 0 when absent
    pub content_length: u64,

    /// First characters of a text body, or a binary placeholder
    pub content_snippet: String,

    /// Whether the URL or headers signal a downloadable data file
    pub is_downloadable: bool,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// When the fetch happened
    pub fetched_at: DateTime<Utc>,
}

impl UrlMetadata {
    /// Minimal metadata for tests and stubs.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: 200,
            content_type: "unknown".to_string(),
            content_length: 0,
            content_snippet: String::new(),
            is_downloadable: false,
            headers: HashMap::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the content snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.content_snippet = snippet.into();
        self
    }

    /// Mark as downloadable.
    pub fn downloadable(mut self) -> Self {
        self.is_downloadable = true;
        self
    }
}

/// Whether a URL or content type signals a directly downloadable file.
pub fn looks_downloadable(url: &str, content_type: &str) -> bool {
    let lower = url.to_lowercase();
    DOWNLOADABLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || content_type.contains("application/octet-stream")
        || content_type.contains("text/csv")
        || content_type.contains("application/json")
}

/// URL metadata fetcher.
#[async_trait]
pub trait UrlAnalyzer: Send + Sync {
    /// Fetch metadata and a content snippet for a URL.
    async fn analyze(&self, url: &str) -> Result<UrlMetadata>;
}

#[async_trait]
impl<T: UrlAnalyzer + ?Sized> UrlAnalyzer for std::sync::Arc<T> {
    async fn analyze(&self, url: &str) -> Result<UrlMetadata> {
        (**self).analyze(url).await
    }
}

/// HTTP-backed analyzer with a bounded fetch timeout.
pub struct HttpUrlAnalyzer {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpUrlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpUrlAnalyzer {
    /// Create an analyzer with a 10 second fetch timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create an analyzer with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            user_agent: "DataScout/1.0".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl UrlAnalyzer for HttpUrlAnalyzer {
    async fn analyze(&self, url: &str) -> Result<UrlMetadata> {
        debug!(url = %url, "analyzing URL");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "URL fetch failed");
                if e.is_timeout() {
                    DiscoveryError::FetchTimeout {
                        url: url.to_string(),
                    }
                } else {
                    DiscoveryError::Fetch {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status_code = response.status().as_u16();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let is_downloadable = looks_downloadable(url, &content_type);

        let is_text = content_type.contains("text")
            || content_type.contains("json")
            || content_type.contains("xml");
        let content_snippet = if is_text {
            let body = response.text().await.map_err(|e| DiscoveryError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            body.chars().take(SNIPPET_LIMIT).collect()
        } else {
            "[Binary Content or Large File]".to_string()
        };

        Ok(UrlMetadata {
            url: url.to_string(),
            status_code,
            content_type,
            content_length,
            content_snippet,
            is_downloadable,
            headers,
            fetched_at: Utc::now(),
        })
    }
}

/// Mock analyzer for testing.
#[derive(Default)]
pub struct MockUrlAnalyzer {
    metadata: std::sync::RwLock<HashMap<String, UrlMetadata>>,
    fail: std::sync::atomic::AtomicBool,
    delay: std::sync::RwLock<Option<Duration>>,
    calls: std::sync::RwLock<Vec<String>>,
}

impl MockUrlAnalyzer {
    /// Create a new mock analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add metadata for a URL.
    pub fn with_metadata(self, metadata: UrlMetadata) -> Self {
        self.metadata
            .write()
            .unwrap()
            .insert(metadata.url.clone(), metadata);
        self
    }

    /// Make every analyze call fail.
    pub fn failing(self) -> Self {
        self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        self
    }

    /// Delay every analyze call, for testing in-flight cancellation.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write().unwrap() = Some(delay);
        self
    }

    /// URLs seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl UrlAnalyzer for MockUrlAnalyzer {
    async fn analyze(&self, url: &str) -> Result<UrlMetadata> {
        self.calls.write().unwrap().push(url.to_string());

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DiscoveryError::Fetch {
                url: url.to_string(),
                reason: "mock fetch failure".to_string(),
            });
        }

        Ok(self
            .metadata
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| UrlMetadata::new(url)))
    }
}
