//! Discovery stage: free-text description to candidate locators.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, warn};

use genai_client::StructuredOutput;

use crate::error::Result;
use crate::prompts::{format_discovery_fallback_prompt, format_query_gen_prompt};
use crate::traits::{generator::TextGenerator, searcher::SearchProvider};
use crate::validator::validate_and_repair;

/// Model response for the direct-discovery fallback.
#[derive(Debug, Default, Deserialize, JsonSchema)]
struct UrlList {
    urls: Vec<String>,
}

/// Turns a dataset description into a ranked list of candidate locators.
pub struct DiscoveryStage<G, S> {
    generator: G,
    searcher: S,
    max_candidates: usize,
    dedup: bool,
}

impl<G: TextGenerator, S: SearchProvider> DiscoveryStage<G, S> {
    /// Create a stage keeping at most 8 candidates.
    pub fn new(generator: G, searcher: S) -> Self {
        Self {
            generator,
            searcher,
            max_candidates: 8,
            dedup: true,
        }
    }

    /// Set the candidate limit.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Keep duplicate locators instead of deduplicating.
    pub fn keep_duplicates(mut self) -> Self {
        self.dedup = false;
        self
    }

    /// Discover candidate locators for a description.
    ///
    /// An empty result is `Ok`: the caller decides whether "no datasets
    /// found" is user-visible.
    pub async fn discover(&self, description: &str) -> Result<Vec<String>> {
        // Ask the model for an optimized search query; fall back to the raw
        // description when that fails or comes back empty.
        let query = match self
            .generator
            .generate(&format_query_gen_prompt(description))
            .await
        {
            Ok(text) => {
                let trimmed = text.trim().trim_matches('"').to_string();
                if trimmed.is_empty() {
                    description.to_string()
                } else {
                    trimmed
                }
            }
            Err(e) => {
                warn!(error = %e, "query optimization failed, searching with raw description");
                description.to_string()
            }
        };
        debug!(query = %query, "running discovery search");

        let urls = match self.searcher.search(&query).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(error = %e, "search provider failed, asking model for candidates directly");
                self.fallback_candidates(description).await
            }
        };

        Ok(self.rank(urls))
    }

    /// Last-resort discovery: ask the model for a best-guess URL list.
    async fn fallback_candidates(&self, description: &str) -> Vec<String> {
        let prompt = format_discovery_fallback_prompt(description);
        let raw = match self
            .generator
            .generate_json(&prompt, Some(UrlList::response_schema()))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "direct discovery fallback failed");
                return Vec::new();
            }
        };

        let repaired = validate_and_repair(
            &self.generator,
            &format!("Find dataset URLs for: {description}"),
            &raw,
            &["urls"],
            UrlList::default,
        )
        .await;

        repaired.value.urls
    }

    /// Deduplicate (order-preserving, first occurrence wins) and truncate.
    fn rank(&self, urls: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut ranked: Vec<String> = if self.dedup {
            urls.into_iter()
                .filter(|u| seen.insert(u.clone()))
                .collect()
        } else {
            urls
        };
        ranked.truncate(self.max_candidates);
        ranked
    }
}
