//! The four pipeline stages.

pub mod analysis;
pub mod discovery;
pub mod refinement;
pub mod strategy;

pub use analysis::{Analysis, AnalysisStage};
pub use discovery::DiscoveryStage;
pub use refinement::RefinementStage;
pub use strategy::StrategyStage;
