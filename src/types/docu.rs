//! Raw documentation records: use cases, scenarios, steps and pages.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::details::Details;
use super::identification::StepIdentification;

/// Outcome of a use case, scenario or step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Passed.
    #[default]
    Success,
    /// Failed.
    Failed,
}

impl Status {
    /// Parse status from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether this status is `Failed`.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A use case: named container of scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    /// Unique name within the build.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// Status; recomputed from the scenarios during aggregation.
    #[serde(default)]
    pub status: Status,
    /// Open-ended details.
    #[serde(default)]
    pub details: Details,
}

impl UseCase {
    /// Create a use case without details.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: Status::Success,
            details: Details::new(),
        }
    }
}

/// Figures computed from a scenario's steps during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioCalculatedData {
    /// Number of page groups observed.
    pub number_of_pages: usize,
    /// Number of steps observed.
    pub number_of_steps: usize,
}

/// A scenario of a use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name within the use case.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// Status as reported by the test run.
    #[serde(default)]
    pub status: Status,
    /// Open-ended details.
    #[serde(default)]
    pub details: Details,
    /// Set by aggregation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_data: Option<ScenarioCalculatedData>,
}

impl Scenario {
    /// Create a scenario with the given status.
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status,
            details: Details::new(),
            calculated_data: None,
        }
    }
}

/// The screen or view a step occurred on.
///
/// Page identity is value equality over name and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page name; steps sharing it are variants of each other.
    pub name: String,
    /// Open-ended details.
    #[serde(default)]
    pub details: Details,
}

impl Page {
    /// Create a page without details.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: Details::new(),
        }
    }
}

/// Describes one step; the raw fields are filled by the test run, the
/// positional and variant fields by aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepDescription {
    /// Ordinal index of the step within its scenario.
    pub index: usize,
    /// Step title.
    #[serde(default)]
    pub title: String,
    /// Step status.
    #[serde(default)]
    pub status: Status,
    /// Reference to the screenshot of this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Index of the page group within the scenario (0-based).
    #[serde(default)]
    pub occurrence: usize,
    /// Position of the step within its page group (0-based).
    #[serde(default)]
    pub relative_index: usize,
    /// 1-based position within the page's build-wide variant chain.
    #[serde(default)]
    pub variant_index: usize,
    /// Previous step on the same page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_step_variant: Option<StepIdentification>,
    /// Next step on the same page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_variant: Option<StepIdentification>,
}

impl StepDescription {
    /// Create a raw description.
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A step of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Description, updated in place by aggregation.
    pub step_description: StepDescription,
    /// Page the step occurred on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    /// Open-ended details.
    #[serde(default)]
    pub details: Details,
}

impl Step {
    /// Create a step on the given page.
    pub fn new(index: usize, title: impl Into<String>, page: Option<Page>) -> Self {
        Self {
            step_description: StepDescription::new(index, title),
            page,
            details: Details::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(Status::from_str("FAILED"), Some(Status::Failed));
        assert_eq!(Status::from_str("success"), Some(Status::Success));
        assert_eq!(Status::from_str("skipped"), None);
    }

    #[test]
    fn test_page_identity_includes_details() {
        let a = Page::new("login");
        let mut b = Page::new("login");
        assert_eq!(a, b);
        b.details.insert("variant".into(), crate::types::DetailValue::text("dark"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_step_json_defaults() {
        let json = r#"{"step_description":{"index":3,"title":"open"}}"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.step_description.index, 3);
        assert!(step.page.is_none());
        assert!(step.step_description.next_step_variant.is_none());
    }
}
