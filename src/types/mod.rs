//! Core types for the documentation aggregator.

pub mod build;
pub mod details;
pub mod docu;
pub mod identification;
pub mod aggregates;

pub use build::{BuildKey, BuildImportStatus};
pub use details::{Details, DetailValue, ObjectReference, ObjectDescription};
pub use docu::{Status, UseCase, Scenario, ScenarioCalculatedData, Page, Step, StepDescription};
pub use identification::StepIdentification;
pub use aggregates::{
    PageSteps, ScenarioPageSteps, UseCaseScenarios, UseCaseScenariosList,
    PageVariantsCounter, ReferencePath, ObjectIndex, ObjectList, LongObjectNamesIndex,
};
