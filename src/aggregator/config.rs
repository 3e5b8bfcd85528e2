//! Aggregator configuration.

use serde::{Deserialize, Serialize};

use crate::AGGREGATED_DATA_FORMAT_VERSION;

/// Default maximum length of an object name used directly as a storage key.
pub const DEFAULT_MAX_OBJECT_NAME_LENGTH: usize = 100;

/// What to do with a scenario whose raw data is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedScenarioPolicy {
    /// Fail the whole build; no version stamp is written.
    #[default]
    Abort,
    /// Skip the scenario like a missing one and continue.
    Skip,
}

impl MalformedScenarioPolicy {
    /// Parse policy from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Configuration of a [`DocuAggregator`](super::DocuAggregator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Version stamp written after a successful run and compared by the
    /// staleness check.
    pub file_format_version: String,
    /// Handling of malformed scenarios.
    pub malformed_scenario_policy: MalformedScenarioPolicy,
    /// Longest object name used as-is for a storage key.
    pub max_object_name_length: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            file_format_version: AGGREGATED_DATA_FORMAT_VERSION.to_string(),
            malformed_scenario_policy: MalformedScenarioPolicy::default(),
            max_object_name_length: DEFAULT_MAX_OBJECT_NAME_LENGTH,
        }
    }
}

impl AggregatorConfig {
    /// Override the format version.
    pub fn with_file_format_version(mut self, version: impl Into<String>) -> Self {
        self.file_format_version = version.into();
        self
    }

    /// Override the malformed scenario policy.
    pub fn with_malformed_scenario_policy(mut self, policy: MalformedScenarioPolicy) -> Self {
        self.malformed_scenario_policy = policy;
        self
    }

    /// Override the maximum object name length.
    pub fn with_max_object_name_length(mut self, max: usize) -> Self {
        self.max_object_name_length = max;
        self
    }
}
