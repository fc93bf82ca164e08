//! Configuration for the discovery pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum candidate locators kept from discovery. Default: 8.
    pub max_candidates: usize,

    /// Pause between locators in streaming mode, to avoid upstream
    /// throttling. Default: 1500 ms.
    #[serde(with = "duration_ms")]
    pub inter_item_delay: Duration,

    /// Pause between the analysis and strategy calls for one locator.
    /// Default: 1000 ms.
    #[serde(with = "duration_ms")]
    pub intra_item_delay: Duration,

    /// Bytes sampled from the head of an uploaded file. Default: 2048.
    pub file_sample_bytes: usize,

    /// Deduplicate repeated locators within one discovery result.
    /// Default: true.
    pub dedup_locators: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_candidates: 8,
            inter_item_delay: Duration::from_millis(1500),
            intra_item_delay: Duration::from_millis(1000),
            file_sample_bytes: 2048,
            dedup_locators: true,
        }
    }
}

impl PlannerConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of candidates.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Set the inter-locator pacing delay.
    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    /// Set the analysis-to-strategy delay.
    pub fn with_intra_item_delay(mut self, delay: Duration) -> Self {
        self.intra_item_delay = delay;
        self
    }

    /// Set the file sample size in bytes.
    pub fn with_file_sample_bytes(mut self, bytes: usize) -> Self {
        self.file_sample_bytes = bytes;
        self
    }

    /// Disable locator deduplication.
    pub fn keep_duplicate_locators(mut self) -> Self {
        self.dedup_locators = false;
        self
    }

    /// Zero delays, for tests.
    pub fn without_delays(mut self) -> Self {
        self.inter_item_delay = Duration::ZERO;
        self.intra_item_delay = Duration::ZERO;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.max_candidates, 8);
        assert_eq!(config.inter_item_delay, Duration::from_millis(1500));
        assert!(config.dedup_locators);
    }

    #[test]
    fn test_serde_round_trip_millis() {
        let config = PlannerConfig::new().with_inter_item_delay(Duration::from_millis(250));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"inter_item_delay\":250"));

        let back: PlannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.inter_item_delay, Duration::from_millis(250));
    }
}
