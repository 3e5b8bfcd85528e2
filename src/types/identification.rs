//! Stable step locators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locates one step of a build by value.
///
/// Variant links are stored as identifications rather than pointers, so a
/// chain can be rebuilt from persisted records alone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepIdentification {
    /// Use case the step belongs to.
    pub use_case_name: String,
    /// Scenario the step belongs to.
    pub scenario_name: String,
    /// Page the step occurred on.
    pub page_name: String,
    /// Absolute index of the step within the scenario.
    pub index: usize,
    /// Page group index within the scenario.
    pub occurrence: usize,
    /// Position within the page group.
    pub relative_index: usize,
}

impl StepIdentification {
    /// Create a new step identification.
    pub fn new(
        use_case_name: impl Into<String>,
        scenario_name: impl Into<String>,
        page_name: impl Into<String>,
        index: usize,
        occurrence: usize,
        relative_index: usize,
    ) -> Self {
        Self {
            use_case_name: use_case_name.into(),
            scenario_name: scenario_name.into(),
            page_name: page_name.into(),
            index,
            occurrence,
            relative_index,
        }
    }

    /// Whether the step lives in `scenario` of `use_case`.
    pub fn belongs_to(&self, use_case: &str, scenario: &str) -> bool {
        self.use_case_name == use_case && self.scenario_name == scenario
    }
}

impl fmt::Display for StepIdentification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}#{}.{}",
            self.use_case_name, self.scenario_name, self.page_name, self.occurrence, self.relative_index
        )
    }
}
