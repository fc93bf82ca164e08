//! Domain types for the discovery pipeline.

pub mod config;
pub mod run;
pub mod source;

pub use config::PlannerConfig;
pub use run::{RunPhase, RunState};
pub use source::{AccessMethod, DiscoveredSource, Strategy};
