//! Session wrapper over the planner for interactive callers.
//!
//! A [`DiscoverySession`] owns the shared [`RunState`] a UI reads and enforces
//! the "new search" contract: starting a search supersedes the in-flight run,
//! cancels its work, resets state, and discards any late updates the old run
//! still produces. Refinement replaces one source record atomically.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DiscoveryError, Result};
use crate::planner::Planner;
use crate::traits::{analyzer::UrlAnalyzer, generator::TextGenerator, searcher::SearchProvider};
use crate::types::{run::RunState, source::DiscoveredSource};

/// One user-facing discovery session.
///
/// Methods take `&self`; share the session behind an `Arc` to drive a search
/// from one task while another resets or refines.
pub struct DiscoverySession<G, S, A> {
    planner: Planner<G, S, A>,
    state: RwLock<RunState>,
    /// Bumped on every new search or reset; updates carrying an older epoch
    /// are discarded.
    epoch: AtomicU64,
    cancel: Mutex<CancellationToken>,
    run_id: Mutex<Option<Uuid>>,
}

impl<G, S, A> DiscoverySession<G, S, A>
where
    G: TextGenerator,
    S: SearchProvider,
    A: UrlAnalyzer,
{
    /// Wrap a planner in a session.
    pub fn new(planner: Planner<G, S, A>) -> Self {
        Self {
            planner,
            state: RwLock::new(RunState::new()),
            epoch: AtomicU64::new(0),
            cancel: Mutex::new(CancellationToken::new()),
            run_id: Mutex::new(None),
        }
    }

    /// The underlying planner.
    pub fn planner(&self) -> &Planner<G, S, A> {
        &self.planner
    }

    /// A copy of the current run state.
    pub async fn snapshot(&self) -> RunState {
        self.state.read().await.clone()
    }

    /// Identifier of the active run, if one was started.
    pub async fn run_id(&self) -> Option<Uuid> {
        *self.run_id.lock().await
    }

    /// Start a search, superseding any in-flight run.
    ///
    /// Drives the planner's stream to completion, publishing every snapshot
    /// into the shared state. Returns the last snapshot this run produced,
    /// which may never have been published if a newer search took over.
    pub async fn new_search(&self, description: &str) -> RunState {
        let (epoch, token) = self.begin_run().await;
        info!(epoch, "starting discovery run");

        let mut last = RunState::new();
        let mut stream = self.planner.stream_plan(description);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(epoch, "run cancelled");
                    break;
                }
                next = futures::StreamExt::next(&mut stream) => match next {
                    Some(update) => {
                        last = update.clone();
                        if !self.publish(epoch, update).await {
                            debug!(epoch, "run superseded, dropping update");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }

        last
    }

    /// Cancel the in-flight run and reset state to idle.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cancel.lock().await.cancel();
        *self.run_id.lock().await = None;
        *state = RunState::new();
    }

    /// Add an uploaded local file as a completed source.
    ///
    /// Bypasses discovery and analysis; the file is planned directly and
    /// appended to the current state.
    pub async fn add_file(&self, file_name: &str, content: &[u8]) -> DiscoveredSource {
        let source = self.planner.plan_for_file(file_name, content).await;

        let mut state = self.state.write().await;
        state.sources.push(source.clone());
        state.total_count += 1;
        state.completed_count += 1;
        source
    }

    /// Refine the source at `index` and replace it in place.
    ///
    /// The replacement is atomic: readers see either the old record or the
    /// new one, never a partial edit. Fails with [`DiscoveryError::Cancelled`]
    /// if a new search superseded the state mid-refinement.
    pub async fn refine_at(&self, index: usize, instructions: &str) -> Result<DiscoveredSource> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let source = {
            let state = self.state.read().await;
            state
                .sources
                .get(index)
                .cloned()
                .ok_or(DiscoveryError::SourceNotFound { index })?
        };

        let refined = self.planner.refine_source(&source, instructions).await?;

        let mut state = self.state.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(DiscoveryError::Cancelled);
        }
        match state.sources.get_mut(index) {
            Some(slot) => {
                *slot = refined.clone();
                Ok(refined)
            }
            None => Err(DiscoveryError::SourceNotFound { index }),
        }
    }

    /// Bump the epoch, swap in a fresh cancellation token, and reset state.
    ///
    /// The epoch bump happens under the state write lock, so a stale run
    /// either publishes before the reset or sees the new epoch and stops.
    async fn begin_run(&self) -> (u64, CancellationToken) {
        let mut state = self.state.write().await;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let token = CancellationToken::new();
        {
            let mut cancel = self.cancel.lock().await;
            cancel.cancel();
            *cancel = token.clone();
        }
        *self.run_id.lock().await = Some(Uuid::new_v4());
        *state = RunState::new();

        (epoch, token)
    }

    /// Publish an update if the run is still current.
    async fn publish(&self, epoch: u64, update: RunState) -> bool {
        let mut state = self.state.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        *state = update;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoopPacer;
    use crate::testing::MockGenerator;
    use crate::traits::analyzer::MockUrlAnalyzer;
    use crate::traits::searcher::MockSearchProvider;
    use crate::types::config::PlannerConfig;
    use crate::types::run::RunPhase;
    use crate::types::source::AccessMethod;
    use std::sync::Arc;
    use std::time::Duration;

    const CSV_URL: &str = "http://example.com/data.csv";

    fn scenario_generator() -> MockGenerator {
        MockGenerator::new()
            .with_response_for("search query optimizer", "city temperatures csv")
            .with_response_for(
                "expert web analyst",
                r#"{"accessMethod": "DIRECT_DOWNLOAD", "target": "http://example.com/data.csv",
                    "justification": "URL ends in .csv", "confidence": 95}"#,
            )
            .with_response_for(
                "needs to download a file",
                r#"{"snippet": "curl -O http://example.com/data.csv",
                    "confidence": 90, "confidenceReason": "direct link"}"#,
            )
            .with_response_for("data pipeline architect", "- Drop rows with null values")
    }

    fn scenario_session(
        analyzer: MockUrlAnalyzer,
    ) -> DiscoverySession<MockGenerator, MockSearchProvider, Arc<MockUrlAnalyzer>> {
        let searcher = MockSearchProvider::new().with_urls("city temperatures csv", &[CSV_URL]);
        let planner = Planner::with_config(
            scenario_generator(),
            searcher,
            Arc::new(analyzer),
            PlannerConfig::default().without_delays(),
        )
        .with_pacer(NoopPacer);
        DiscoverySession::new(planner)
    }

    #[tokio::test]
    async fn test_new_search_publishes_final_state() {
        let session = scenario_session(MockUrlAnalyzer::new());

        assert!(session.run_id().await.is_none());
        let last = session.new_search("CSV of city temperatures").await;

        assert_eq!(last.sources.len(), 1);
        assert_eq!(last.sources[0].locator, CSV_URL);
        assert_eq!(last.phase, RunPhase::Idle);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.sources.len(), 1);
        assert!(session.run_id().await.is_some());
    }

    #[tokio::test]
    async fn test_reset_cancels_inflight_run_and_discards_late_updates() {
        let analyzer = MockUrlAnalyzer::new().with_delay(Duration::from_millis(150));
        let session = Arc::new(scenario_session(analyzer));

        let runner = Arc::clone(&session);
        let handle = tokio::spawn(async move {
            runner.new_search("CSV of city temperatures").await;
        });

        // Let the run reach the delayed analyze call, then supersede it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.reset().await;
        handle.await.unwrap();

        let snapshot = session.snapshot().await;
        assert!(snapshot.sources.is_empty());
        assert_eq!(snapshot.phase, RunPhase::Idle);
        assert!(session.run_id().await.is_none());

        // The delayed analyze resolves after cancellation; nothing may land.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(session.snapshot().await.sources.is_empty());
    }

    #[tokio::test]
    async fn test_new_search_supersedes_previous_run() {
        let analyzer = MockUrlAnalyzer::new().with_delay(Duration::from_millis(150));
        let session = Arc::new(scenario_session(analyzer));

        let first = Arc::clone(&session);
        let handle = tokio::spawn(async move {
            first.new_search("CSV of city temperatures").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = session.new_search("CSV of city temperatures").await;
        handle.await.unwrap();

        // Only the second run's output is visible.
        assert_eq!(second.sources.len(), 1);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.sources.len(), 1);
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.completed_count, 1);
    }

    #[tokio::test]
    async fn test_refine_at_replaces_record_atomically() {
        let session = scenario_session(MockUrlAnalyzer::new());
        session.new_search("CSV of city temperatures").await;

        let refined = session.refine_at(0, "drop null rows").await.unwrap();
        assert_eq!(
            refined.cleaning_strategy.as_deref(),
            Some("- Drop rows with null values")
        );

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.sources.len(), 1);
        assert_eq!(
            snapshot.sources[0].cleaning_strategy.as_deref(),
            Some("- Drop rows with null values")
        );
        assert_eq!(snapshot.sources[0].locator, CSV_URL);
    }

    #[tokio::test]
    async fn test_refine_at_unknown_index() {
        let session = scenario_session(MockUrlAnalyzer::new());
        session.new_search("CSV of city temperatures").await;

        let err = session.refine_at(7, "drop null rows").await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::SourceNotFound { index: 7 }
        ));
    }

    #[tokio::test]
    async fn test_add_file_appends_completed_source() {
        let generator = MockGenerator::new().with_response_for(
            "uploaded a local file",
            r#"{"snippet": "import pandas as pd", "confidence": 85,
                "confidenceReason": "CSV header present"}"#,
        );
        let planner = Planner::with_config(
            generator,
            MockSearchProvider::new(),
            Arc::new(MockUrlAnalyzer::new()),
            PlannerConfig::default().without_delays(),
        );
        let session = DiscoverySession::new(planner);

        let source = session.add_file("temps.csv", b"city,temp\nOslo,4\n").await;
        assert_eq!(source.access_method, AccessMethod::LocalFile);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.sources.len(), 1);
        assert_eq!(snapshot.total_count, 1);
        assert!(snapshot.counters_consistent());
    }
}
