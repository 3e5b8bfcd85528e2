//! The aggregation engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::{DerivedStore, RawStore};
use crate::types::{
    BuildImportStatus, BuildKey, ObjectReference, ReferencePath, Scenario, ScenarioPageSteps,
    Status, Step, StepIdentification, UseCase, UseCaseScenarios, UseCaseScenariosList,
};
use super::config::{AggregatorConfig, MalformedScenarioPolicy};
use super::objects::{ObjectRepository, CASE_TYPE};
use super::pagination::{calculated_data, paginate_steps};
use super::variants::{set_next_variant, StepVariantResolver};
use super::AggregationError;

/// Why a scenario was left out of a build's derived data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// Its raw record could not be found.
    Missing,
    /// Its raw record is malformed and the policy is to skip.
    Malformed,
    /// Its name repeats an earlier use case or scenario and the policy is to skip.
    Duplicate,
}

/// A scenario omitted from aggregation, with the warning that was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedScenario {
    /// Use case name.
    pub use_case: String,
    /// Scenario name.
    pub scenario: String,
    /// Why it was skipped.
    pub reason: SkipReason,
    /// Warning message.
    pub message: String,
}

/// Outcome of aggregating one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// The aggregated build.
    pub build: BuildKey,
    /// Use cases processed.
    pub use_cases: usize,
    /// Scenarios aggregated.
    pub scenarios: usize,
    /// Steps aggregated.
    pub steps: usize,
    /// Distinct page names with a variant chain.
    pub pages: usize,
    /// Distinct objects indexed.
    pub objects: usize,
    /// Scenarios left out.
    pub skipped: Vec<SkippedScenario>,
}

impl AggregationReport {
    fn new(build: BuildKey) -> Self {
        Self {
            build,
            use_cases: 0,
            scenarios: 0,
            steps: 0,
            pages: 0,
            objects: 0,
            skipped: Vec::new(),
        }
    }
}

/// Aggregates documentation builds from a raw store into a derived store.
///
/// The engine itself holds no build state: every call to
/// [`calculate_aggregated_data_for_build`](Self::calculate_aggregated_data_for_build)
/// creates a fresh [`BuildAggregation`] context. Different builds may be
/// aggregated in parallel on separate threads; the same build must not be.
pub struct DocuAggregator<R: RawStore, D: DerivedStore> {
    raw: Arc<R>,
    derived: Arc<D>,
    config: AggregatorConfig,
}

impl<R: RawStore, D: DerivedStore> DocuAggregator<R, D> {
    /// Create an aggregator with the default configuration.
    pub fn new(raw: Arc<R>, derived: Arc<D>) -> Self {
        Self::with_config(raw, derived, AggregatorConfig::default())
    }

    /// Create an aggregator with an explicit configuration.
    pub fn with_config(raw: Arc<R>, derived: Arc<D>, config: AggregatorConfig) -> Self {
        Self { raw, derived, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Get a reference to the derived store.
    pub fn derived_store(&self) -> &D {
        &self.derived
    }

    /// Whether the build has derived data stamped with the current format version.
    ///
    /// An absent, older or newer stamp all mean the build must be recomputed.
    pub fn contains_aggregated_data_for_build(&self, build: &BuildKey) -> Result<bool, AggregationError> {
        let version = self.derived.load_version(build)?;
        Ok(matches!(version, Some(v) if !v.trim().is_empty() && v == self.config.file_format_version))
    }

    /// Import status of a build, given whether its import failed.
    pub fn build_status(&self, build: &BuildKey, import_failed: bool) -> Result<BuildImportStatus, AggregationError> {
        if import_failed {
            return Ok(BuildImportStatus::Failed);
        }
        let status = match self.derived.load_version(build)? {
            Some(v) if v.trim().is_empty() => BuildImportStatus::Unprocessed,
            Some(v) if v == self.config.file_format_version => BuildImportStatus::Success,
            Some(_) => BuildImportStatus::Outdated,
            None => BuildImportStatus::Unprocessed,
        };
        Ok(status)
    }

    /// Delete all derived data of a build.
    pub fn remove_aggregated_data_for_build(&self, build: &BuildKey) -> Result<(), AggregationError> {
        info!(branch = %build.branch, build = %build.build, "removing aggregated data");
        self.derived.delete_derived(build)?;
        Ok(())
    }

    /// Recompute all derived data of a build from scratch.
    ///
    /// The version stamp is written last; a failure at any point leaves the
    /// build without a stamp, i.e. unaggregated.
    pub fn calculate_aggregated_data_for_build(
        &self,
        build: &BuildKey,
    ) -> Result<AggregationReport, AggregationError> {
        info!(branch = %build.branch, build = %build.build, "calculating aggregated data for build");
        self.remove_aggregated_data_for_build(build)?;

        BuildAggregation::new(build, &*self.raw, &*self.derived, &self.config).run()
    }

    /// Aggregate the build unless it already carries current derived data.
    pub fn aggregate_if_outdated(&self, build: &BuildKey) -> Result<Option<AggregationReport>, AggregationError> {
        if self.contains_aggregated_data_for_build(build)? {
            debug!(branch = %build.branch, build = %build.build, "aggregated data is current");
            return Ok(None);
        }
        self.calculate_aggregated_data_for_build(build).map(Some)
    }
}

/// State of one build's aggregation pass; dropped when the pass ends.
pub struct BuildAggregation<'a, R: RawStore + ?Sized, D: DerivedStore + ?Sized> {
    build: &'a BuildKey,
    raw: &'a R,
    derived: &'a D,
    config: &'a AggregatorConfig,
    variants: StepVariantResolver,
    objects: ObjectRepository,
    report: AggregationReport,
}

impl<'a, R: RawStore + ?Sized, D: DerivedStore + ?Sized> BuildAggregation<'a, R, D> {
    /// Create a fresh context for one build.
    pub fn new(build: &'a BuildKey, raw: &'a R, derived: &'a D, config: &'a AggregatorConfig) -> Self {
        Self {
            build,
            raw,
            derived,
            config,
            variants: StepVariantResolver::new(),
            objects: ObjectRepository::new(build.clone(), config.max_object_name_length),
            report: AggregationReport::new(build.clone()),
        }
    }

    /// Run the full pass and persist every artifact.
    pub fn run(mut self) -> Result<AggregationReport, AggregationError> {
        let mut list = self.calculate_use_case_scenarios_list()?;
        for use_case_scenarios in &mut list.use_case_scenarios {
            self.aggregate_use_case(use_case_scenarios)?;
        }

        self.variants.close_chains(self.derived, self.build)?;
        self.derived.save_page_variants(self.build, &self.variants.counters())?;
        self.derived.save_use_case_scenarios_list(self.build, &list)?;
        self.objects.calculate_and_save_object_lists(self.derived)?;
        self.derived
            .save_long_object_names(self.build, &self.objects.long_names().to_index())?;
        self.derived
            .save_version(self.build, &self.config.file_format_version)?;

        self.report.use_cases = list.use_case_scenarios.len();
        self.report.pages = self.variants.num_pages();
        self.report.objects = self.objects.num_objects();
        info!(
            branch = %self.build.branch,
            build = %self.build.build,
            use_cases = self.report.use_cases,
            scenarios = self.report.scenarios,
            steps = self.report.steps,
            pages = self.report.pages,
            skipped = self.report.skipped.len(),
            "aggregation complete"
        );
        Ok(self.report)
    }

    /// Load the listing of the build. Repeated names are malformed: only the
    /// first use case or scenario of a name is kept.
    fn calculate_use_case_scenarios_list(&mut self) -> Result<UseCaseScenariosList, AggregationError> {
        let use_cases = self.raw.load_use_cases(self.build).map_err(|e| {
            if e.is_not_found() {
                AggregationError::UseCasesNotFound(self.build.clone())
            } else {
                AggregationError::Store(e)
            }
        })?;

        let mut use_case_names = BTreeSet::new();
        let mut use_case_scenarios = Vec::with_capacity(use_cases.len());
        for mut use_case in use_cases {
            if !use_case_names.insert(use_case.name.clone()) {
                let err = AggregationError::DuplicateUseCase(use_case.name.clone());
                let message = err.to_string();
                self.tolerate(err)?;
                for scenario in self.raw.load_scenarios(self.build, &use_case.name)? {
                    self.skip(&use_case, &scenario, SkipReason::Duplicate, message.clone());
                }
                continue;
            }

            let mut scenario_names = BTreeSet::new();
            let mut scenarios = Vec::new();
            for scenario in self.raw.load_scenarios(self.build, &use_case.name)? {
                if scenario_names.insert(scenario.name.clone()) {
                    scenarios.push(scenario);
                    continue;
                }
                let err = AggregationError::DuplicateScenario {
                    use_case: use_case.name.clone(),
                    scenario: scenario.name.clone(),
                };
                let message = err.to_string();
                self.tolerate(err)?;
                self.skip(&use_case, &scenario, SkipReason::Duplicate, message);
            }

            let any_failed = scenarios.iter().any(|s| s.status.is_failed());
            use_case.status = if any_failed { Status::Failed } else { Status::Success };
            use_case_scenarios.push(UseCaseScenarios { use_case, scenarios });
        }
        Ok(UseCaseScenariosList { use_case_scenarios })
    }

    fn aggregate_use_case(&mut self, use_case_scenarios: &mut UseCaseScenarios) -> Result<(), AggregationError> {
        let use_case = use_case_scenarios.use_case.clone();
        info!(use_case = %use_case.name, "calculating aggregated data for use case");

        let case_path = ObjectRepository::create_path(
            &[],
            ObjectRepository::create_object_reference(CASE_TYPE, &use_case.name),
        );
        self.objects.add_objects(&case_path, &use_case.details);

        let scenarios = std::mem::take(&mut use_case_scenarios.scenarios);
        for scenario in scenarios {
            if let Some(aggregated) = self.aggregate_scenario(&case_path, &use_case, scenario)? {
                use_case_scenarios.scenarios.push(aggregated);
            }
        }

        self.derived.save_use_case_scenarios(self.build, use_case_scenarios)?;
        self.objects
            .update_and_save_object_indexes_for_current_case(self.derived)?;
        Ok(())
    }

    /// Aggregate and persist one scenario. `Ok(None)` if it was skipped.
    fn aggregate_scenario(
        &mut self,
        case_path: &[ObjectReference],
        use_case: &UseCase,
        mut scenario: Scenario,
    ) -> Result<Option<Scenario>, AggregationError> {
        let steps = match self.raw.load_steps(self.build, &use_case.name, &scenario.name) {
            Ok(steps) => steps,
            Err(e) if e.is_not_found() => {
                self.skip(use_case, &scenario, SkipReason::Missing, e.to_string());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(err) = validate_steps(&use_case.name, &scenario.name, &steps) {
            let message = err.to_string();
            self.tolerate(err)?;
            self.skip(use_case, &scenario, SkipReason::Malformed, message);
            return Ok(None);
        }

        debug!(use_case = %use_case.name, scenario = %scenario.name, steps = steps.len(), "calculating aggregated data for scenario");
        let scenario_path: ReferencePath = self.objects.add_referenced_scenario_objects(case_path, &scenario);

        let groups = paginate_steps(&steps);
        scenario.calculated_data = Some(calculated_data(&groups));
        let mut page_steps = ScenarioPageSteps {
            use_case: use_case.clone(),
            scenario: scenario.clone(),
            pages_and_steps: groups,
        };

        let mut index = 0;
        for occurrence in 0..page_steps.pages_and_steps.len() {
            for relative_index in 0..page_steps.pages_and_steps[occurrence].steps.len() {
                let step = &steps[index];
                if let Some(page) = &step.page {
                    let current = StepIdentification::new(
                        &use_case.name,
                        &scenario.name,
                        &page.name,
                        index,
                        occurrence,
                        relative_index,
                    );
                    self.link_variant(&mut page_steps, &page.name, current)?;
                }

                let desc = &page_steps.pages_and_steps[occurrence].steps[relative_index];
                self.objects
                    .add_referenced_step_objects(&scenario_path, step.page.as_ref(), desc, &step.details);
                index += 1;
            }
        }

        self.derived.save_scenario_page_steps(self.build, &page_steps)?;
        self.report.scenarios += 1;
        self.report.steps += steps.len();
        Ok(Some(scenario))
    }

    fn link_variant(
        &mut self,
        page_steps: &mut ScenarioPageSteps,
        page_name: &str,
        current: StepIdentification,
    ) -> Result<(), AggregationError> {
        let link = self.variants.link_step(page_name, &current);
        let desc = page_steps
            .step_mut(current.occurrence, current.relative_index)
            .ok_or_else(|| AggregationError::VariantTargetMissing(current.clone()))?;
        desc.variant_index = link.variant_index;
        desc.previous_step_variant = link.previous.clone();

        if let Some(previous) = &link.previous {
            set_next_variant(self.derived, self.build, Some(page_steps), previous, &current)?;
        }
        Ok(())
    }

    /// Apply the malformed-data policy. `Ok` means the record is skipped.
    fn tolerate(&self, err: AggregationError) -> Result<(), AggregationError> {
        match self.config.malformed_scenario_policy {
            MalformedScenarioPolicy::Abort => Err(err),
            MalformedScenarioPolicy::Skip => Ok(()),
        }
    }

    fn skip(&mut self, use_case: &UseCase, scenario: &Scenario, reason: SkipReason, message: String) {
        warn!(
            use_case = %use_case.name,
            scenario = %scenario.name,
            reason = ?reason,
            error = %message,
            "could not aggregate scenario, skipping"
        );
        self.report.skipped.push(SkippedScenario {
            use_case: use_case.name.clone(),
            scenario: scenario.name.clone(),
            reason,
            message,
        });
    }
}

/// Reject steps the variant chains cannot be built from.
pub fn validate_steps(use_case: &str, scenario: &str, steps: &[Step]) -> Result<(), AggregationError> {
    for (index, step) in steps.iter().enumerate() {
        if let Some(page) = &step.page {
            if page.name.trim().is_empty() {
                return Err(AggregationError::MalformedStep {
                    use_case: use_case.to_string(),
                    scenario: scenario.to_string(),
                    index,
                    reason: "page without a name".to_string(),
                });
            }
        }
    }
    Ok(())
}
