//! Collaborator trait abstractions.

pub mod analyzer;
pub mod generator;
pub mod searcher;

pub use analyzer::{HttpUrlAnalyzer, MockUrlAnalyzer, UrlAnalyzer, UrlMetadata};
pub use generator::TextGenerator;
pub use searcher::{MockSearchProvider, SearchProvider, SerperSearchProvider};
