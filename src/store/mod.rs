//! Storage backends.
//!
//! The aggregator reads raw documentation from a [`RawStore`] and writes
//! derived records to a [`DerivedStore`]. Both are synchronous: every call
//! is a blocking round trip.

pub mod memory;
pub mod file;

use crate::types::{
    BuildKey, UseCase, Scenario, Step,
    ScenarioPageSteps, UseCaseScenarios, UseCaseScenariosList,
    PageVariantsCounter, ObjectIndex, ObjectList, LongObjectNamesIndex,
};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this is the not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Create a not-found error for a record path.
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

/// Read access to raw documentation records.
///
/// Implementations must return records in their stored order; the variant
/// chains depend on it.
pub trait RawStore: Send + Sync {
    /// Load all use cases of a build.
    fn load_use_cases(&self, build: &BuildKey) -> Result<Vec<UseCase>, StoreError>;

    /// Load all scenarios of a use case.
    fn load_scenarios(&self, build: &BuildKey, use_case: &str) -> Result<Vec<Scenario>, StoreError>;

    /// Load all steps of a scenario.
    fn load_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Vec<Step>, StoreError>;
}

/// Key-addressed persistence for aggregated records.
///
/// Loads return `Ok(None)` for absent records. Saves overwrite.
pub trait DerivedStore: Send + Sync {
    /// Load the format version stamp of a build.
    fn load_version(&self, build: &BuildKey) -> Result<Option<String>, StoreError>;

    /// Write the format version stamp of a build.
    fn save_version(&self, build: &BuildKey, version: &str) -> Result<(), StoreError>;

    /// Delete every derived record of a build, stamp included.
    fn delete_derived(&self, build: &BuildKey) -> Result<(), StoreError>;

    /// Save the use case summary list.
    fn save_use_case_scenarios_list(
        &self,
        build: &BuildKey,
        list: &UseCaseScenariosList,
    ) -> Result<(), StoreError>;

    /// Load the use case summary list.
    fn load_use_case_scenarios_list(
        &self,
        build: &BuildKey,
    ) -> Result<Option<UseCaseScenariosList>, StoreError>;

    /// Save one use case with its scenarios.
    fn save_use_case_scenarios(
        &self,
        build: &BuildKey,
        scenarios: &UseCaseScenarios,
    ) -> Result<(), StoreError>;

    /// Load one use case with its scenarios.
    fn load_use_case_scenarios(
        &self,
        build: &BuildKey,
        use_case: &str,
    ) -> Result<Option<UseCaseScenarios>, StoreError>;

    /// Save a scenario's page steps, keyed by its use case and scenario names.
    fn save_scenario_page_steps(
        &self,
        build: &BuildKey,
        page_steps: &ScenarioPageSteps,
    ) -> Result<(), StoreError>;

    /// Load a scenario's page steps.
    fn load_scenario_page_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Option<ScenarioPageSteps>, StoreError>;

    /// Save the per-page variant counters.
    fn save_page_variants(&self, build: &BuildKey, counters: &PageVariantsCounter) -> Result<(), StoreError>;

    /// Load the per-page variant counters.
    fn load_page_variants(&self, build: &BuildKey) -> Result<Option<PageVariantsCounter>, StoreError>;

    /// Save the long object name table.
    fn save_long_object_names(&self, build: &BuildKey, names: &LongObjectNamesIndex) -> Result<(), StoreError>;

    /// Load the long object name table.
    fn load_long_object_names(&self, build: &BuildKey) -> Result<Option<LongObjectNamesIndex>, StoreError>;

    /// Save the reference index of one object, addressed by its resolved key.
    fn save_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
        index: &ObjectIndex,
    ) -> Result<(), StoreError>;

    /// Load the reference index of one object.
    fn load_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
    ) -> Result<Option<ObjectIndex>, StoreError>;

    /// Save the list of all objects of one type.
    fn save_object_list(&self, build: &BuildKey, list: &ObjectList) -> Result<(), StoreError>;

    /// Load the list of all objects of one type.
    fn load_object_list(&self, build: &BuildKey, object_type: &str) -> Result<Option<ObjectList>, StoreError>;

    /// Save the names of all object types seen in a build.
    fn save_object_types(&self, build: &BuildKey, types: &[String]) -> Result<(), StoreError>;

    /// Load the names of all object types seen in a build.
    fn load_object_types(&self, build: &BuildKey) -> Result<Option<Vec<String>>, StoreError>;
}

pub use memory::{InMemoryRawStore, InMemoryDerivedStore};
pub use file::{FileRawStore, FileDerivedStore};
