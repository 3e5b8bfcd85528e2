//! Aggregation: turning a raw documentation build into browsing data.
//!
//! ## Pipeline
//!
//! ```text
//! RawStore → use cases → scenarios → steps
//!                              ↓
//!                 paginate → link variants → record objects
//!                              ↓
//!   DerivedStore ← page steps (per scenario), chains closed, indices, stamp
//! ```
//!
//! A pass is strictly sequential: chain order is traversal order.

pub mod config;
pub mod engine;
pub mod long_names;
pub mod objects;
pub mod pagination;
pub mod variants;

pub use config::{AggregatorConfig, MalformedScenarioPolicy, DEFAULT_MAX_OBJECT_NAME_LENGTH};
pub use engine::{DocuAggregator, AggregationReport, SkippedScenario, SkipReason};
pub use long_names::LongObjectNamesResolver;
pub use objects::ObjectRepository;
pub use pagination::{paginate_steps, calculated_data};
pub use variants::{StepVariantResolver, StepVariantState, VariantLink, set_next_variant, set_previous_variant};

use crate::store::StoreError;
use crate::types::{BuildKey, StepIdentification};

/// Error type for aggregation.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// The use case list of the build could not be loaded.
    #[error("Use case list not found for build {0}")]
    UseCasesNotFound(BuildKey),
    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// A raw step is inconsistent.
    #[error("Malformed step {index} in {use_case}/{scenario}: {reason}")]
    MalformedStep {
        /// Use case of the step.
        use_case: String,
        /// Scenario of the step.
        scenario: String,
        /// Position of the step in its scenario.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// A use case name is listed twice in the build.
    #[error("Duplicate use case {0}")]
    DuplicateUseCase(String),
    /// A scenario name is listed twice in its use case.
    #[error("Duplicate scenario {use_case}/{scenario}")]
    DuplicateScenario {
        /// Use case listing the scenario.
        use_case: String,
        /// Repeated scenario name.
        scenario: String,
    },
    /// A variant link points at a step that is not in the derived store.
    #[error("Variant target step not found: {0}")]
    VariantTargetMissing(StepIdentification),
}
