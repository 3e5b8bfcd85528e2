//! Derived records produced by aggregation.
//!
//! Every map here is a `BTreeMap` so that two aggregations of the same raw
//! input serialize byte-identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::details::{ObjectDescription, ObjectReference};
use super::docu::{Page, Scenario, StepDescription, UseCase};
use super::identification::StepIdentification;

/// One page group of a scenario: consecutive steps on the same page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSteps {
    /// The page, or `None` for steps without a page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    /// Step descriptions in raw order.
    pub steps: Vec<StepDescription>,
}

impl PageSteps {
    /// Open a new, empty group.
    pub fn new(page: Option<Page>) -> Self {
        Self { page, steps: Vec::new() }
    }
}

/// A scenario with all its pages and steps; persisted once per scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPageSteps {
    /// Snapshot of the owning use case.
    pub use_case: UseCase,
    /// Snapshot of the scenario, including calculated data.
    pub scenario: Scenario,
    /// Page groups in raw step order.
    pub pages_and_steps: Vec<PageSteps>,
}

impl ScenarioPageSteps {
    /// Locate a step by its (occurrence, relative index) position.
    pub fn step_mut(&mut self, occurrence: usize, relative_index: usize) -> Option<&mut StepDescription> {
        self.pages_and_steps
            .get_mut(occurrence)
            .and_then(|group| group.steps.get_mut(relative_index))
    }

    /// Locate a step by its identification.
    pub fn step(&self, id: &StepIdentification) -> Option<&StepDescription> {
        self.pages_and_steps
            .get(id.occurrence)
            .and_then(|group| group.steps.get(id.relative_index))
    }

    /// All step descriptions, in order, across every page group.
    pub fn all_steps(&self) -> impl Iterator<Item = &StepDescription> {
        self.pages_and_steps.iter().flat_map(|group| group.steps.iter())
    }
}

/// A use case with its scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseScenarios {
    /// The use case, with its aggregated status.
    pub use_case: UseCase,
    /// Its scenarios.
    pub scenarios: Vec<Scenario>,
}

/// Summary of every use case of a build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UseCaseScenariosList {
    /// Use cases in raw order.
    pub use_case_scenarios: Vec<UseCaseScenarios>,
}

/// Number of steps per page name across a build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageVariantsCounter {
    /// Counter by page name.
    pub counters: BTreeMap<String, usize>,
}

/// Ordered list of references from the use case down to where an object
/// was mentioned.
pub type ReferencePath = Vec<ObjectReference>;

/// All places a single object is referenced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIndex {
    /// The object; details are empty if it was only ever referenced by name.
    pub object: ObjectDescription,
    /// Distinct reference paths in first-seen order.
    pub references: Vec<ReferencePath>,
}

impl ObjectIndex {
    /// Create an index entry without references.
    pub fn new(object: ObjectDescription) -> Self {
        Self {
            object,
            references: Vec::new(),
        }
    }

    /// Append a path unless it is already present. Returns whether it was added.
    pub fn add_reference(&mut self, path: &ReferencePath) -> bool {
        if self.references.contains(path) {
            return false;
        }
        self.references.push(path.clone());
        true
    }
}

/// All objects of one type within a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectList {
    /// Object type.
    pub object_type: String,
    /// Objects sorted by name.
    pub objects: Vec<ObjectDescription>,
}

/// Persisted form of the long-name table: identifier → raw name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LongObjectNamesIndex {
    /// Raw object name by short identifier.
    pub names: BTreeMap<String, String>,
}
