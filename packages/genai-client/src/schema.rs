//! Type-safe schema generation for Gemini structured outputs.
//!
//! Uses the `schemars` crate to generate JSON schemas from Rust types, then
//! strips the keywords Gemini's `responseSchema` does not accept.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Trait for types that can be used as a Gemini response schema.
///
/// Automatically implemented for any type that implements
/// `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible JSON schema for this type.
    ///
    /// Gemini's `responseSchema` accepts an OpenAPI-style subset:
    /// no `$schema`, no `$ref`/`definitions`, no `additionalProperties`,
    /// no `format` on strings. This method inlines references and removes
    /// the unsupported keywords from the schemars output.
    fn response_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);
        strip_unsupported(&mut value);

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
            map.remove("title");
        }

        value
    }

    /// Get the schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Remove keywords Gemini rejects, recursively.
fn strip_unsupported(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.remove("additionalProperties");
            map.remove("format");
            map.remove("$schema");
            for (_, v) in map.iter_mut() {
                strip_unsupported(v);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                strip_unsupported(item);
            }
        }
        _ => {}
    }
}

/// Inline all `$ref` references by substituting from `definitions`.
fn inline_refs(value: &mut serde_json::Value) {
    let definitions = if let serde_json::Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut serde_json::Value, defs: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(reference)) = map.get("$ref") {
                let name = reference.rsplit('/').next().unwrap_or_default().to_string();
                if let Some(resolved) = defs.get(&name) {
                    let mut resolved = resolved.clone();
                    inline_refs_recursive(&mut resolved, defs);
                    *value = resolved;
                    return;
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, defs);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, defs);
            }
        }
        _ => {}
    }
}
