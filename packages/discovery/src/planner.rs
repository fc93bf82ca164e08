//! The planner - orchestrates the four stages into full ingestion plans.
//!
//! Two operating modes:
//! - [`build_plan`](Planner::build_plan): batch mode, per-locator units run
//!   concurrently, failures are dropped from the result.
//! - [`stream_plan`](Planner::stream_plan): sequential streaming mode with
//!   pacing delays, emitting a [`RunState`] snapshot after every observable
//!   transition.
//!
//! Local files bypass discovery and analysis entirely; refinement runs
//! out-of-band against one existing source.

use async_stream::stream;
use futures::{future::join_all, Stream};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pacing::{FixedDelayPacer, Pacer};
use crate::stages::{AnalysisStage, DiscoveryStage, RefinementStage, StrategyStage};
use crate::traits::{analyzer::UrlAnalyzer, generator::TextGenerator, searcher::SearchProvider};
use crate::types::{
    config::PlannerConfig,
    run::RunState,
    source::{AccessMethod, DiscoveredSource},
};

/// The pipeline orchestrator.
///
/// # Example
///
/// ```rust,ignore
/// use discovery::{Planner, SerperSearchProvider, HttpUrlAnalyzer};
/// use genai_client::GenAiClient;
///
/// let planner = Planner::new(
///     GenAiClient::from_env()?,
///     SerperSearchProvider::from_env(),
///     HttpUrlAnalyzer::new(),
/// );
///
/// let plan = planner.build_plan("CSV of city temperatures").await?;
/// ```
pub struct Planner<G, S, A> {
    discovery: DiscoveryStage<Arc<G>, S>,
    analysis: AnalysisStage<Arc<G>, A>,
    strategy: StrategyStage<Arc<G>>,
    refinement: RefinementStage<Arc<G>>,
    pacer: Box<dyn Pacer>,
    config: PlannerConfig,
}

impl<G, S, A> Planner<G, S, A>
where
    G: TextGenerator,
    S: SearchProvider,
    A: UrlAnalyzer,
{
    /// Create a planner with default configuration.
    pub fn new(generator: G, searcher: S, analyzer: A) -> Self {
        Self::with_config(generator, searcher, analyzer, PlannerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(generator: G, searcher: S, analyzer: A, config: PlannerConfig) -> Self {
        let generator = Arc::new(generator);

        let mut discovery = DiscoveryStage::new(Arc::clone(&generator), searcher)
            .with_max_candidates(config.max_candidates);
        if !config.dedup_locators {
            discovery = discovery.keep_duplicates();
        }

        Self {
            discovery,
            analysis: AnalysisStage::new(Arc::clone(&generator), analyzer),
            strategy: StrategyStage::new(Arc::clone(&generator)),
            refinement: RefinementStage::new(generator),
            pacer: Box::new(FixedDelayPacer::new(config.inter_item_delay)),
            config,
        }
    }

    /// Replace the pacing policy.
    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Batch mode: assemble a full ingestion plan.
    ///
    /// Per-locator units run concurrently; a failing locator is logged and
    /// dropped rather than failing the whole plan. Returns an empty plan
    /// when discovery finds nothing.
    pub async fn build_plan(&self, description: &str) -> Result<Vec<DiscoveredSource>> {
        let locators = self.discovery.discover(description).await?;
        if locators.is_empty() {
            return Ok(Vec::new());
        }

        let futures = locators.iter().map(|locator| self.process_locator(locator));
        let results = join_all(futures).await;

        let mut sources = Vec::with_capacity(results.len());
        for (locator, result) in locators.iter().zip(results) {
            match result {
                Ok(source) => sources.push(source),
                Err(e) => {
                    warn!(url = %locator, error = %e, "skipping source after processing failure");
                }
            }
        }

        info!(sources = sources.len(), total = locators.len(), "plan assembled");
        Ok(sources)
    }

    /// Streaming mode: yield a [`RunState`] snapshot after every observable
    /// transition.
    ///
    /// Locators are processed sequentially with a pacing pause between them
    /// to respect upstream rate limits. A per-locator failure is counted but
    /// appends nothing, visible as fewer results than requested.
    pub fn stream_plan<'a>(
        &'a self,
        description: &'a str,
    ) -> Pin<Box<dyn Stream<Item = RunState> + Send + 'a>> {
        Box::pin(stream! {
            let mut state = RunState::new();
            state.begin_discovery();
            yield state.clone();

            let locators = match self.discovery.discover(description).await {
                Ok(locators) => locators,
                Err(e) => {
                    state.fail(e.to_string());
                    yield state.clone();
                    return;
                }
            };

            if locators.is_empty() {
                state.fail("No datasets found. Try refining your description.");
                yield state.clone();
                return;
            }

            state.begin_processing(locators.len());
            yield state.clone();

            for (i, locator) in locators.iter().enumerate() {
                if i > 0 {
                    self.pacer.pause().await;
                }

                state.set_current(locator);
                yield state.clone();

                match self.process_locator(locator).await {
                    Ok(source) => state.complete_item(Some(source)),
                    Err(e) => {
                        warn!(url = %locator, error = %e, "locator failed, continuing run");
                        state.complete_item(None);
                    }
                }
                yield state.clone();
            }

            state.finish();
            yield state.clone();
        })
    }

    /// Analyze one locator and synthesize its strategy.
    async fn process_locator(&self, locator: &str) -> Result<DiscoveredSource> {
        let analysis = self.analysis.analyze(locator).await;
        debug!(url = %locator, method = %analysis.access_method, "locator classified");

        if !self.config.intra_item_delay.is_zero() {
            tokio::time::sleep(self.config.intra_item_delay).await;
        }

        let strategy = self
            .strategy
            .synthesize(analysis.access_method, &analysis.target)
            .await?;

        Ok(
            DiscoveredSource::new(analysis.target, analysis.access_method)
                .with_justification(analysis.justification)
                .with_confidence(analysis.confidence)
                .with_strategy(strategy),
        )
    }

    /// Local-file mode: build one source from an uploaded file.
    ///
    /// Samples the head of the file plus, for large files, a chunk from the
    /// middle, keeping the prompt bounded to a few KB.
    pub async fn plan_for_file(&self, file_name: &str, content: &[u8]) -> DiscoveredSource {
        let sample = sample_file_content(content, self.config.file_sample_bytes);
        let strategy = self.strategy.synthesize_for_file(file_name, &sample).await;

        DiscoveredSource::new(file_name, AccessMethod::LocalFile)
            .with_justification(format!(
                "An ingestion plan generated for the uploaded file '{file_name}'."
            ))
            .with_strategy(strategy)
    }

    /// Refinement: produce a replacement source with a cleaning plan.
    ///
    /// Does not re-run discovery, analysis, or strategy; the returned record
    /// replaces the original wholesale.
    pub async fn refine_source(
        &self,
        source: &DiscoveredSource,
        instructions: &str,
    ) -> Result<DiscoveredSource> {
        let context = source.strategy.to_context_json();
        let steps = self.refinement.refine(&context, instructions).await?;
        Ok(source.refined(steps))
    }
}

/// Sample file content for the strategy prompt: head chunk plus a chunk from
/// the middle when the file is large enough for the head to be unrepresentative.
pub(crate) fn sample_file_content(content: &[u8], chunk_size: usize) -> String {
    let head_end = content.len().min(chunk_size);
    let mut sample = String::from_utf8_lossy(&content[..head_end]).into_owned();

    if content.len() > chunk_size * 2 {
        let middle_start = content.len() / 2 - chunk_size / 2;
        let middle_end = (middle_start + chunk_size).min(content.len());
        sample.push_str("\n\n... (sample from middle of file) ...\n\n");
        sample.push_str(&String::from_utf8_lossy(&content[middle_start..middle_end]));
    }

    sample
}
