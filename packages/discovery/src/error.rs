//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Text generation service failed
    #[error("generation error: {0}")]
    Generation(#[from] genai_client::GenAiError),

    /// Search provider failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// URL metadata fetch failed
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Fetch exceeded its deadline
    #[error("timeout fetching: {url}")]
    FetchTimeout { url: String },

    /// No strategy template exists for the requested access method
    #[error("no strategy template for access method: {method}")]
    NoStrategyTemplate { method: String },

    /// Refinement was requested with empty instructions
    #[error("refinement instructions must not be empty")]
    EmptyInstructions,

    /// Refinement generation failed with no usable fallback
    #[error("refinement failed: {0}")]
    Refinement(String),

    /// Source index out of range for refinement
    #[error("no source at index {index}")]
    SourceNotFound { index: usize },

    /// Operation was cancelled by a newer run
    #[error("run cancelled")]
    Cancelled,
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
