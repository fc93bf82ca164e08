//! Dataset Discovery Pipeline
//!
//! A query-driven pipeline that turns a natural language description of a
//! dataset into concrete ingestion plans: where the data lives, how to access
//! it, and a ready-to-run acquisition strategy with a confidence score.
//!
//! # Design Philosophy
//!
//! **"Plans, not guesses"**
//!
//! - Every classification is grounded in fetched URL metadata, not the model's
//!   memory of a site
//! - Model output is validated and repaired before it reaches a caller; a
//!   stage degrades to a labeled fallback instead of failing the run
//! - Streaming first: callers observe every state transition of a run
//! - Library handles orchestration, app handles presentation
//!
//! # Usage
//!
//! ```rust,ignore
//! use discovery::{Planner, SerperSearchProvider, HttpUrlAnalyzer};
//! use genai_client::GenAiClient;
//!
//! let planner = Planner::new(
//!     GenAiClient::from_env()?,
//!     SerperSearchProvider::from_env(),
//!     HttpUrlAnalyzer::new(),
//! );
//!
//! // Batch mode: one full plan
//! let plan = planner.build_plan("CSV of average city temperatures").await?;
//!
//! // Streaming mode: observe every transition
//! let mut stream = planner.stream_plan("CSV of average city temperatures");
//! while let Some(state) = stream.next().await {
//!     println!("{}/{} complete", state.completed_count, state.total_count);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (TextGenerator, SearchProvider, UrlAnalyzer)
//! - [`types`] - Plan and run data types
//! - [`stages`] - The four pipeline stages (discovery, analysis, strategy, refinement)
//! - [`planner`] - Stage orchestration, batch and streaming
//! - [`session`] - Interactive session with cancellation and refinement-in-place
//! - [`validator`] - Parse-repair-fallback handling of model JSON
//! - [`pacing`] - Backpressure between upstream calls
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pacing;
pub mod planner;
pub mod prompts;
pub mod session;
pub mod stages;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validator;

// Re-export core types at crate root
pub use error::{DiscoveryError, Result};
pub use traits::{
    analyzer::{HttpUrlAnalyzer, MockUrlAnalyzer, UrlAnalyzer, UrlMetadata},
    generator::TextGenerator,
    searcher::{MockSearchProvider, SearchProvider, SerperSearchProvider},
};
pub use types::{
    config::PlannerConfig,
    run::{RunPhase, RunState},
    source::{AccessMethod, DiscoveredSource, Strategy},
};

// Re-export the orchestration layer
pub use planner::Planner;
pub use session::DiscoverySession;

// Re-export pipeline stages
pub use stages::{Analysis, AnalysisStage, DiscoveryStage, RefinementStage, StrategyStage};

// Re-export pacing policies
pub use pacing::{FixedDelayPacer, NoopPacer, Pacer, ThrottledPacer};

// Re-export validation
pub use validator::{validate_and_repair, Repaired};

// Re-export testing utilities
pub use testing::{MockGenerator, RecordedCall};
