//! Search provider trait for candidate URL discovery.
//!
//! The discovery stage turns a description into a search query; this trait
//! abstracts over the engine that runs it (Serper, SerpAPI, etc.). Failures
//! are ordinary errors the discovery stage catches and falls back from.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::{DiscoveryError, Result};

/// Web search for dataset URL discovery.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web and return candidate URLs, best first.
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: SearchProvider + ?Sized> SearchProvider for std::sync::Arc<T> {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        (**self).search(query).await
    }
}

/// Serper.dev-backed search provider.
///
/// When constructed without an API key, returns a demo list of dataset
/// catalog searches instead of failing, so the pipeline stays usable in
/// unconfigured environments.
pub struct SerperSearchProvider {
    api_key: Option<SecretString>,
    client: reqwest::Client,
    /// Number of results requested per query.
    pub num_results: usize,
}

impl SerperSearchProvider {
    /// Create a provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            client: reqwest::Client::new(),
            num_results: 10,
        }
    }

    /// Create an unconfigured provider that serves demo results.
    pub fn unconfigured() -> Self {
        Self {
            api_key: None,
            client: reqwest::Client::new(),
            num_results: 10,
        }
    }

    /// Create from the `SERPER_API_KEY` environment variable, falling back
    /// to demo results when unset.
    pub fn from_env() -> Self {
        match std::env::var("SERPER_API_KEY") {
            Ok(key) if !key.is_empty() => Self::new(key),
            _ => Self::unconfigured(),
        }
    }

    /// Set the number of results per query.
    pub fn with_num_results(mut self, num: usize) -> Self {
        self.num_results = num;
        self
    }

    fn demo_results(query: &str) -> Vec<String> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        vec![
            format!("https://catalog.data.gov/dataset?q={encoded}"),
            format!("https://www.kaggle.com/search?q={encoded}"),
            format!("https://huggingface.co/datasets?search={encoded}"),
        ]
    }
}

#[async_trait]
impl SearchProvider for SerperSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let Some(api_key) = &self.api_key else {
            warn!("SERPER_API_KEY not configured, returning demo search results");
            return Ok(Self::demo_results(query));
        };

        #[derive(serde::Serialize)]
        struct Request<'a> {
            q: &'a str,
            num: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            organic: Vec<OrganicResult>,
        }

        #[derive(serde::Deserialize)]
        struct OrganicResult {
            link: String,
        }

        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", api_key.expose_secret())
            .json(&Request {
                q: query,
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Search(Box::new(std::io::Error::other(
                format!("search API returned HTTP {}", response.status()),
            ))));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        Ok(parsed.organic.into_iter().map(|r| r.link).collect())
    }
}

/// Mock search provider for testing.
#[derive(Default)]
pub struct MockSearchProvider {
    results: std::sync::RwLock<std::collections::HashMap<String, Vec<String>>>,
    fail: std::sync::atomic::AtomicBool,
    calls: std::sync::RwLock<Vec<String>>,
}

impl MockSearchProvider {
    /// Create a new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        self.results.write().unwrap().insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    /// Make every search fail.
    pub fn failing(self) -> Self {
        self.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        self
    }

    /// Queries seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        self.calls.write().unwrap().push(query.to_string());

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DiscoveryError::Search(Box::new(std::io::Error::other(
                "mock search failure",
            ))));
        }

        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_provider() {
        let provider = MockSearchProvider::new().with_urls(
            "city temperature csv",
            &["https://example.com/data.csv", "https://example.com/portal"],
        );

        let urls = provider.search("city temperature csv").await.unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://example.com/data.csv");
        assert_eq!(provider.calls(), vec!["city temperature csv"]);
    }

    #[tokio::test]
    async fn test_unconfigured_serper_returns_demo_list() {
        let provider = SerperSearchProvider::unconfigured();
        let urls = provider.search("city temperatures").await.unwrap();

        assert_eq!(urls.len(), 3);
        assert!(urls[0].starts_with("https://catalog.data.gov/"));
        assert!(urls[0].contains("city%20temperatures") || urls[0].contains("city+temperatures"));
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let provider = MockSearchProvider::new().failing();
        assert!(provider.search("anything").await.is_err());
    }
}
