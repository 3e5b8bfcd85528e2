//! # docu-aggregator
//!
//! Aggregation of hierarchical test documentation for browsing.
//!
//! A documentation build is organized as
//! branch → build → use case → scenario → step, each step optionally tied
//! to a page. The aggregator turns one build into:
//!
//! 1. Paginated step sequences per scenario (consecutive steps on the same
//!    page form a group)
//! 2. Build-wide "same page" variant chains: a circular, doubly linked
//!    list through every step on a page, across all scenarios
//! 3. An object reference index with stable short names for object names
//!    unfit as storage keys
//!
//! ## Architecture
//!
//! ```text
//! RawStore → DocuAggregator ─┬─ paginate_steps
//!                            ├─ StepVariantResolver
//!                            └─ ObjectRepository ─ LongObjectNamesResolver
//!                    ↓
//!              DerivedStore (Memory or JSON files)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Chain order is traversal order: use cases, scenarios and steps as the
//!   raw store returns them
//! - Persisted maps are `BTreeMap`s; re-running on unchanged input writes
//!   identical records
//! - The version stamp is written last; a build without a current stamp is
//!   unaggregated

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod aggregator;
pub mod canonical;

// Re-exports
pub use types::{
    BuildKey, BuildImportStatus, Status, UseCase, Scenario, ScenarioCalculatedData,
    Page, Step, StepDescription, StepIdentification,
    Details, DetailValue, ObjectReference, ObjectDescription,
};
pub use types::aggregates::{
    PageSteps, ScenarioPageSteps, UseCaseScenarios, UseCaseScenariosList,
    PageVariantsCounter, ReferencePath, ObjectIndex, ObjectList, LongObjectNamesIndex,
};
pub use store::{RawStore, DerivedStore, StoreError};
pub use store::{InMemoryRawStore, InMemoryDerivedStore, FileRawStore, FileDerivedStore};
pub use aggregator::{
    DocuAggregator, AggregationError, AggregationReport, SkippedScenario, SkipReason,
    AggregatorConfig, MalformedScenarioPolicy,
    StepVariantResolver, StepVariantState, VariantLink,
    ObjectRepository, LongObjectNamesResolver,
    paginate_steps,
};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Format version of the aggregated data.
///
/// Bump on any change to the shape of a persisted derived record; builds
/// stamped with another version are recomputed.
pub const AGGREGATED_DATA_FORMAT_VERSION: &str = "1.0.0";
