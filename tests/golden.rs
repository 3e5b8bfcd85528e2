//! Golden tests for the documentation aggregator.
//!
//! These tests verify chain closure, pagination, skipping, staleness and
//! idempotence over small hand-built documentation builds.

use std::sync::Arc;

use docu_aggregator::{
    AggregatorConfig, BuildKey, DerivedStore, DetailValue, DocuAggregator, InMemoryDerivedStore,
    InMemoryRawStore, ObjectDescription, ObjectReference, Page, RawStore, Scenario, SkipReason,
    Status, Step, StepIdentification, StoreError, UseCase, AGGREGATED_DATA_FORMAT_VERSION,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn build() -> BuildKey {
    BuildKey::new("develop", "nightly-42")
}

fn steps_on(pages: &[&str]) -> Vec<Step> {
    pages
        .iter()
        .enumerate()
        .map(|(i, p)| Step::new(i, format!("step {i}"), Some(Page::new(*p))))
        .collect()
}

fn aggregator_over(raw: Arc<InMemoryRawStore>) -> DocuAggregator<InMemoryRawStore, InMemoryDerivedStore> {
    DocuAggregator::new(raw, Arc::new(InMemoryDerivedStore::new()))
}

fn id(use_case: &str, scenario: &str, page: &str) -> StepIdentification {
    StepIdentification::new(use_case, scenario, page, 0, 0, 0)
}

/// Raw store that deletes one scenario as soon as another one's steps are read.
struct DeletingRawStore {
    inner: Arc<InMemoryRawStore>,
    trigger: (String, String),
    victim: (String, String),
}

impl RawStore for DeletingRawStore {
    fn load_use_cases(&self, build: &BuildKey) -> Result<Vec<UseCase>, StoreError> {
        self.inner.load_use_cases(build)
    }

    fn load_scenarios(&self, build: &BuildKey, use_case: &str) -> Result<Vec<Scenario>, StoreError> {
        self.inner.load_scenarios(build, use_case)
    }

    fn load_steps(&self, build: &BuildKey, use_case: &str, scenario: &str) -> Result<Vec<Step>, StoreError> {
        let steps = self.inner.load_steps(build, use_case, scenario)?;
        if (use_case, scenario) == (self.trigger.0.as_str(), self.trigger.1.as_str()) {
            self.inner.remove_scenario(build, &self.victim.0, &self.victim.1);
        }
        Ok(steps)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Variant Chains
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_two_scenarios_on_one_page_form_two_cycle() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "U", Scenario::new("S1", Status::Success), steps_on(&["P"]));
    raw.add_scenario(&build(), "U", Scenario::new("S2", Status::Success), steps_on(&["P"]));
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();

    let store = agg.derived_store();
    let s1 = store.load_scenario_page_steps(&build(), "U", "S1").unwrap().unwrap();
    let s2 = store.load_scenario_page_steps(&build(), "U", "S2").unwrap().unwrap();
    let d1 = &s1.pages_and_steps[0].steps[0];
    let d2 = &s2.pages_and_steps[0].steps[0];

    assert_eq!(d1.next_step_variant, Some(id("U", "S2", "P")));
    assert_eq!(d1.previous_step_variant, Some(id("U", "S2", "P")));
    assert_eq!(d2.next_step_variant, Some(id("U", "S1", "P")));
    assert_eq!(d2.previous_step_variant, Some(id("U", "S1", "P")));
    assert_eq!(d1.variant_index, 1);
    assert_eq!(d2.variant_index, 2);

    let counters = store.load_page_variants(&build()).unwrap().unwrap();
    assert_eq!(counters.counters.get("P"), Some(&2));
}

#[test]
fn test_chain_spans_use_cases_in_traversal_order() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "B", Scenario::new("s", Status::Success), steps_on(&["home"]));
    raw.add_scenario(&build(), "A", Scenario::new("s", Status::Success), steps_on(&["home"]));
    raw.add_scenario(&build(), "C", Scenario::new("s", Status::Success), steps_on(&["home"]));
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();

    let store = agg.derived_store();
    let next_of = |uc: &str| {
        store
            .load_scenario_page_steps(&build(), uc, "s")
            .unwrap()
            .unwrap()
            .pages_and_steps[0]
            .steps[0]
            .next_step_variant
            .clone()
            .unwrap()
            .use_case_name
    };
    assert_eq!(next_of("B"), "A");
    assert_eq!(next_of("A"), "C");
    assert_eq!(next_of("C"), "B");
}

#[test]
fn test_zero_step_scenario_contributes_nothing() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "U", Scenario::new("empty", Status::Success), vec![]);
    raw.add_scenario(&build(), "U", Scenario::new("one", Status::Success), steps_on(&["P"]));
    let agg = aggregator_over(raw);
    let report = agg.calculate_aggregated_data_for_build(&build()).unwrap();
    assert_eq!(report.scenarios, 2);
    assert_eq!(report.steps, 1);

    let store = agg.derived_store();
    let empty = store.load_scenario_page_steps(&build(), "U", "empty").unwrap().unwrap();
    assert!(empty.pages_and_steps.is_empty());
    let data = empty.scenario.calculated_data.unwrap();
    assert_eq!((data.number_of_pages, data.number_of_steps), (0, 0));

    let one = store.load_scenario_page_steps(&build(), "U", "one").unwrap().unwrap();
    assert_eq!(one.pages_and_steps[0].steps[0].next_step_variant, Some(id("U", "one", "P")));
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_pagination_is_lossless_and_counts_observed_groups() {
    let raw = Arc::new(InMemoryRawStore::new());
    let pages = ["login", "login", "home", "search", "search", "home"];
    raw.add_scenario(&build(), "U", Scenario::new("S", Status::Success), steps_on(&pages));
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();

    let sps = agg
        .derived_store()
        .load_scenario_page_steps(&build(), "U", "S")
        .unwrap()
        .unwrap();
    let order: Vec<usize> = sps.all_steps().map(|d| d.index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);

    let positions: Vec<(usize, usize)> = sps.all_steps().map(|d| (d.occurrence, d.relative_index)).collect();
    assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (2, 0), (2, 1), (3, 0)]);

    let data = sps.scenario.calculated_data.unwrap();
    assert_eq!(data.number_of_pages, 4);
    assert_eq!(data.number_of_steps, 6);

    let summary = agg
        .derived_store()
        .load_use_case_scenarios(&build(), "U")
        .unwrap()
        .unwrap();
    assert_eq!(summary.scenarios[0].calculated_data, Some(data));
}

// ─────────────────────────────────────────────────────────────────────────────
// Missing Records And Status
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_scenario_deleted_mid_run_is_skipped() {
    let inner = Arc::new(InMemoryRawStore::new());
    for name in ["S1", "S2", "S3"] {
        inner.add_scenario(&build(), "U", Scenario::new(name, Status::Success), steps_on(&["P"]));
    }
    let raw = Arc::new(DeletingRawStore {
        inner,
        trigger: ("U".into(), "S1".into()),
        victim: ("U".into(), "S2".into()),
    });
    let agg = DocuAggregator::new(raw, Arc::new(InMemoryDerivedStore::new()));
    let report = agg.calculate_aggregated_data_for_build(&build()).unwrap();

    assert_eq!(report.scenarios, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].scenario, "S2");
    assert_eq!(report.skipped[0].reason, SkipReason::Missing);

    let store = agg.derived_store();
    let list = store.load_use_case_scenarios_list(&build()).unwrap().unwrap();
    let names: Vec<&str> = list.use_case_scenarios[0].scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["S1", "S3"]);
    assert!(store.load_scenario_page_steps(&build(), "U", "S2").unwrap().is_none());

    let s1 = store.load_scenario_page_steps(&build(), "U", "S1").unwrap().unwrap();
    assert_eq!(s1.pages_and_steps[0].steps[0].next_step_variant, Some(id("U", "S3", "P")));
    assert!(agg.contains_aggregated_data_for_build(&build()).unwrap());
}

#[test]
fn test_use_case_status_derived_from_scenarios() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "mixed", Scenario::new("ok", Status::Success), steps_on(&["P"]));
    raw.add_scenario(&build(), "mixed", Scenario::new("broken", Status::Failed), steps_on(&["P"]));
    raw.add_scenario(&build(), "green", Scenario::new("ok", Status::Success), steps_on(&["P"]));
    raw.add_scenario(&build(), "green", Scenario::new("ok2", Status::Success), steps_on(&["P"]));
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();

    let list = agg.derived_store().load_use_case_scenarios_list(&build()).unwrap().unwrap();
    let statuses: Vec<(&str, Status)> = list
        .use_case_scenarios
        .iter()
        .map(|u| (u.use_case.name.as_str(), u.use_case.status))
        .collect();
    assert_eq!(statuses, vec![("mixed", Status::Failed), ("green", Status::Success)]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Staleness And Idempotence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_version_bump_is_detected_as_stale() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "U", Scenario::new("S", Status::Success), steps_on(&["P"]));
    let derived = Arc::new(InMemoryDerivedStore::new());

    let current = DocuAggregator::new(Arc::clone(&raw), Arc::clone(&derived));
    assert!(!current.contains_aggregated_data_for_build(&build()).unwrap());
    current.calculate_aggregated_data_for_build(&build()).unwrap();
    assert!(current.contains_aggregated_data_for_build(&build()).unwrap());
    assert_eq!(
        derived.load_version(&build()).unwrap().as_deref(),
        Some(AGGREGATED_DATA_FORMAT_VERSION)
    );

    let bumped = DocuAggregator::with_config(
        raw,
        derived,
        AggregatorConfig::default().with_file_format_version("2.0.0"),
    );
    assert!(!bumped.contains_aggregated_data_for_build(&build()).unwrap());
}

#[test]
fn test_reaggregation_is_idempotent() {
    let raw = Arc::new(InMemoryRawStore::new());
    let mut use_case = UseCase::new("U");
    use_case
        .details
        .insert("owner".into(), DetailValue::reference("team", "checkout"));
    raw.add_use_case(&build(), use_case);
    raw.add_scenario(&build(), "U", Scenario::new("S1", Status::Success), steps_on(&["a", "b", "a"]));
    raw.add_scenario(&build(), "U", Scenario::new("S2", Status::Failed), steps_on(&["b", "c"]));
    raw.add_scenario(&build(), "V", Scenario::new("S1", Status::Success), steps_on(&["a"]));
    let agg = aggregator_over(raw);

    let first_report = agg.calculate_aggregated_data_for_build(&build()).unwrap();
    let first = agg.derived_store().fingerprint(&build()).unwrap();
    let second_report = agg.calculate_aggregated_data_for_build(&build()).unwrap();
    let second = agg.derived_store().fingerprint(&build()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

#[test]
fn test_removal_clears_stamp() {
    let raw = Arc::new(InMemoryRawStore::new());
    raw.add_scenario(&build(), "U", Scenario::new("S", Status::Success), steps_on(&["P"]));
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();
    agg.remove_aggregated_data_for_build(&build()).unwrap();
    assert!(!agg.contains_aggregated_data_for_build(&build()).unwrap());
    assert_eq!(agg.derived_store().num_records(&build()), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Object Index
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_objects_indexed_along_reference_paths() {
    let raw = Arc::new(InMemoryRawStore::new());
    let mut use_case = UseCase::new("Checkout");
    use_case
        .details
        .insert("owner".into(), DetailValue::reference("team", "payments"));
    raw.add_use_case(&build(), use_case);

    let mut scenario = Scenario::new("pay by card", Status::Success);
    scenario.details.insert(
        "customer".into(),
        DetailValue::Object(
            ObjectDescription::new("user", "alice").with_detail("tier", DetailValue::text("gold")),
        ),
    );
    let mut steps = steps_on(&["cart", "payment"]);
    steps[1]
        .details
        .insert("team".into(), DetailValue::reference("team", "payments"));
    raw.add_scenario(&build(), "Checkout", scenario, steps);

    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();
    let store = agg.derived_store();

    let team = store.load_object_index(&build(), "team", "payments").unwrap().unwrap();
    assert!(team.object.details.is_empty());
    assert_eq!(team.references.len(), 2);
    assert_eq!(team.references[0], vec![ObjectReference::new("case", "Checkout")]);
    assert_eq!(
        team.references[1],
        vec![
            ObjectReference::new("case", "Checkout"),
            ObjectReference::new("scenario", "pay by card"),
            ObjectReference::new("step", "payment/1/0"),
        ]
    );

    let user = store.load_object_index(&build(), "user", "alice").unwrap().unwrap();
    assert_eq!(user.object.details.get("tier"), Some(&DetailValue::text("gold")));

    let pages = store.load_object_list(&build(), "page").unwrap().unwrap();
    let names: Vec<&str> = pages.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["cart", "payment"]);

    let types = store.load_object_types(&build()).unwrap().unwrap();
    assert_eq!(types, vec!["page", "team", "user"]);
}

#[test]
fn test_long_object_names_persisted() {
    let raw = Arc::new(InMemoryRawStore::new());
    let long_name = "x".repeat(250);
    let mut steps = steps_on(&["P"]);
    steps[0]
        .details
        .insert("doc".into(), DetailValue::reference("document", long_name.clone()));
    raw.add_scenario(&build(), "U", Scenario::new("S", Status::Success), steps);
    let agg = aggregator_over(raw);
    agg.calculate_aggregated_data_for_build(&build()).unwrap();

    let table = agg.derived_store().load_long_object_names(&build()).unwrap().unwrap();
    assert_eq!(table.names.len(), 1);
    let (short, long) = table.names.iter().next().unwrap();
    assert_eq!(long, &long_name);
    assert!(short.len() <= 100);

    let index = agg
        .derived_store()
        .load_object_index(&build(), "document", short)
        .unwrap()
        .unwrap();
    assert_eq!(index.object.name, long_name);
}
