//! Structured-output validation and repair.
//!
//! Upstream models routinely return truncated or malformed JSON. Every stage
//! passes raw model output through [`validate_and_repair`], which tries a
//! direct parse, then one model repair pass, then a deterministic fallback.
//! The function never fails past its boundary: the rest of the pipeline is
//! isolated from upstream unreliability.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::prompts::format_repair_prompt;
use crate::traits::generator::TextGenerator;

/// Outcome of validation, always carrying a usable value.
#[derive(Debug, Clone)]
pub struct Repaired<T> {
    /// The parsed (or fallback) value
    pub value: T,

    /// Whether the repair pass or the fallback was used
    pub was_repaired: bool,

    /// Explanation when `was_repaired` is true
    pub repair_note: Option<String>,
}

impl<T> Repaired<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            was_repaired: false,
            repair_note: None,
        }
    }

    fn repaired(value: T, note: impl Into<String>) -> Self {
        Self {
            value,
            was_repaired: true,
            repair_note: Some(note.into()),
        }
    }
}

/// Parse raw output, checking that every required field is present.
fn try_parse<T: DeserializeOwned>(raw: &str, required_fields: &[&str]) -> Option<T> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;

    let missing: Vec<_> = required_fields
        .iter()
        .filter(|f| value.get(**f).is_none())
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "parsed output is missing required fields");
        return None;
    }

    serde_json::from_value(value).ok()
}

/// Validate raw model output, repairing it once via the model and falling
/// back to a deterministic default if the repair also fails.
///
/// Panics only if `fallback` panics (a caller bug).
pub async fn validate_and_repair<G, T, F>(
    generator: &G,
    task_description: &str,
    raw: &str,
    required_fields: &[&str],
    fallback: F,
) -> Repaired<T>
where
    G: TextGenerator + ?Sized,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    // 1. Direct parse
    if let Some(value) = try_parse(raw, required_fields) {
        return Repaired::clean(value);
    }

    // 2. One repair pass through the model
    let prompt = format_repair_prompt(task_description, raw, required_fields);
    match generator.generate_json(&prompt, None).await {
        Ok(fixed) => {
            if let Some(value) = try_parse(&fixed, required_fields) {
                debug!(task = task_description, "repair pass fixed the output");
                return Repaired::repaired(value, "repair pass corrected the response");
            }
            warn!(task = task_description, "repair pass output still invalid, using fallback");
        }
        Err(e) => {
            warn!(task = task_description, error = %e, "repair pass failed, using fallback");
        }
    }

    // 3. Deterministic fallback
    Repaired::repaired(fallback(), "fallback used after failed validation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGenerator;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Scored {
        confidence: u8,
        #[serde(default)]
        label: Option<String>,
    }

    fn fallback() -> Scored {
        Scored {
            confidence: 0,
            label: Some("fallback".to_string()),
        }
    }

    #[tokio::test]
    async fn test_valid_output_passes_through() {
        let generator = MockGenerator::new();
        let result: Repaired<Scored> = validate_and_repair(
            &generator,
            "score something",
            r#"{"confidence": 80, "label": "ok"}"#,
            &["confidence"],
            fallback,
        )
        .await;

        assert!(!result.was_repaired);
        assert_eq!(result.value.confidence, 80);
        assert!(generator.calls().is_empty(), "no repair call expected");
    }

    #[tokio::test]
    async fn test_malformed_output_repaired_by_model() {
        let generator = MockGenerator::new().with_response(r#"{"confidence": 55}"#);

        let result: Repaired<Scored> = validate_and_repair(
            &generator,
            "score something",
            r#"{"confidence": 55"#, // truncated
            &["confidence"],
            fallback,
        )
        .await;

        assert!(result.was_repaired);
        assert_eq!(result.value.confidence, 55);
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_field_triggers_repair() {
        let generator =
            MockGenerator::new().with_response(r#"{"confidence": 42, "label": "fixed"}"#);

        let result: Repaired<Scored> = validate_and_repair(
            &generator,
            "score something",
            r#"{"label": "no score here"}"#,
            &["confidence"],
            fallback,
        )
        .await;

        assert!(result.was_repaired);
        assert_eq!(result.value.confidence, 42);
    }

    #[tokio::test]
    async fn test_fallback_when_repair_also_fails() {
        let generator = MockGenerator::new().with_response("still not json");

        let result: Repaired<Scored> = validate_and_repair(
            &generator,
            "score something",
            "garbage",
            &["confidence"],
            fallback,
        )
        .await;

        assert!(result.was_repaired);
        assert_eq!(result.value, fallback());
        assert!(result.repair_note.as_deref().unwrap().contains("fallback"));
    }

    #[tokio::test]
    async fn test_fallback_when_generator_errors() {
        let generator = MockGenerator::new().failing();

        let result: Repaired<Scored> = validate_and_repair(
            &generator,
            "score something",
            "garbage",
            &["confidence"],
            fallback,
        )
        .await;

        assert!(result.was_repaired);
        assert_eq!(result.value, fallback());
    }

    #[tokio::test]
    async fn test_output_always_contains_required_field() {
        // Whatever the input, the result always carries a confidence value.
        let generator = MockGenerator::new().with_response("nope");
        for raw in ["", "{", "[1,2,3", "null", "\"just a string\""] {
            let result: Repaired<Scored> =
                validate_and_repair(&generator, "score", raw, &["confidence"], fallback).await;
            assert_eq!(result.value.confidence, 0);
        }
    }
}
