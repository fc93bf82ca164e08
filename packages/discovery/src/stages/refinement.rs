//! Refinement stage: turn cleaning instructions into a cleaning plan.

use tracing::warn;

use crate::error::{DiscoveryError, Result};
use crate::prompts::format_refinement_prompt;
use crate::traits::generator::TextGenerator;

/// Produces a markdown cleaning/transformation plan for an existing strategy.
///
/// Unlike the other stages this one may surface an error: a blank cleaning
/// plan has no sane silent fallback.
pub struct RefinementStage<G> {
    generator: G,
}

impl<G: TextGenerator> RefinementStage<G> {
    /// Create a new refinement stage.
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Generate cleaning steps from the serialized strategy context and
    /// free-text instructions.
    ///
    /// Empty instructions fail fast without calling the model.
    pub async fn refine(&self, strategy_context: &str, instructions: &str) -> Result<String> {
        if instructions.trim().is_empty() {
            return Err(DiscoveryError::EmptyInstructions);
        }

        let prompt = format_refinement_prompt(strategy_context, instructions);
        let steps = self.generator.generate(&prompt).await.map_err(|e| {
            warn!(error = %e, "cleaning step generation failed");
            DiscoveryError::Refinement(e.to_string())
        })?;

        let steps = steps.trim().to_string();
        if steps.is_empty() {
            return Err(DiscoveryError::Refinement(
                "model returned an empty cleaning plan".to_string(),
            ));
        }
        Ok(steps)
    }
}
