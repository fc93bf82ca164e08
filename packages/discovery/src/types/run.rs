//! Streaming run state.
//!
//! A `RunState` is created fresh per user-initiated search, mutated only by
//! the orchestrator driving that run, and discarded on "new search".
//! External readers treat it as a read-only snapshot.

use serde::{Deserialize, Serialize};

use crate::types::source::DiscoveredSource;

/// What the streaming run is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// No run in progress
    Idle,

    /// Finding candidate locators
    Discovering,

    /// Analyzing locators and synthesizing strategies
    Processing,
}

impl Default for RunPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Observable state of one streaming run.
///
/// Invariant once `total_count` is set: `completed_count + pending_count ==
/// total_count`, and `sources.len() <= completed_count` (failed items are
/// counted but not appended).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Append-only during a run; insertion order equals completion order
    pub sources: Vec<DiscoveredSource>,

    /// Number of locators discovery produced
    pub total_count: usize,

    /// Locators fully processed (successfully or not)
    pub completed_count: usize,

    /// Locators still waiting
    pub pending_count: usize,

    /// The locator currently being analyzed; `None` when idle
    pub current_locator: Option<String>,

    /// Current phase
    pub phase: RunPhase,

    /// Explanatory error for the UI, if the run failed outright
    pub last_error: Option<String>,
}

impl RunState {
    /// Fresh idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the counters are internally consistent.
    pub fn counters_consistent(&self) -> bool {
        self.completed_count + self.pending_count == self.total_count
            && self.sources.len() <= self.completed_count
    }

    pub(crate) fn begin_discovery(&mut self) {
        *self = Self::default();
        self.phase = RunPhase::Discovering;
    }

    pub(crate) fn begin_processing(&mut self, total: usize) {
        self.phase = RunPhase::Processing;
        self.total_count = total;
        self.pending_count = total;
        self.completed_count = 0;
    }

    pub(crate) fn set_current(&mut self, locator: &str) {
        self.current_locator = Some(locator.to_string());
    }

    pub(crate) fn complete_item(&mut self, source: Option<DiscoveredSource>) {
        if let Some(source) = source {
            self.sources.push(source);
        }
        self.completed_count += 1;
        self.pending_count = self.pending_count.saturating_sub(1);
    }

    pub(crate) fn finish(&mut self) {
        self.phase = RunPhase::Idle;
        self.current_locator = None;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.phase = RunPhase::Idle;
        self.current_locator = None;
        self.last_error = Some(message.into());
    }
}
