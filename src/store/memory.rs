//! In-memory stores for testing and embedding.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::canonical::canonical_hash_hex;
use crate::types::{
    BuildKey, UseCase, Scenario, Step,
    ScenarioPageSteps, UseCaseScenarios, UseCaseScenariosList,
    PageVariantsCounter, ObjectIndex, ObjectList, LongObjectNamesIndex,
};
use super::{RawStore, DerivedStore, StoreError};

/// Raw records of one build.
#[derive(Debug, Clone, Default)]
struct RawBuild {
    use_cases: Vec<UseCase>,
    scenarios: BTreeMap<String, Vec<Scenario>>,
    steps: BTreeMap<(String, String), Vec<Step>>,
}

/// In-memory raw store.
///
/// Insertion order is the load order. All mutators take `&self` so a test
/// can change records while an aggregation holds the store.
#[derive(Debug, Default)]
pub struct InMemoryRawStore {
    builds: RwLock<BTreeMap<BuildKey, RawBuild>>,
}

impl InMemoryRawStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a use case; an existing one with the same name is replaced in place.
    pub fn add_use_case(&self, build: &BuildKey, use_case: UseCase) {
        let mut builds = self.builds.write();
        let raw = builds.entry(build.clone()).or_default();
        raw.scenarios.entry(use_case.name.clone()).or_default();
        match raw.use_cases.iter_mut().find(|u| u.name == use_case.name) {
            Some(existing) => *existing = use_case,
            None => raw.use_cases.push(use_case),
        }
    }

    /// Add a scenario with its steps to a use case.
    pub fn add_scenario(&self, build: &BuildKey, use_case: &str, scenario: Scenario, steps: Vec<Step>) {
        let mut builds = self.builds.write();
        let raw = builds.entry(build.clone()).or_default();
        if !raw.use_cases.iter().any(|u| u.name == use_case) {
            raw.use_cases.push(UseCase::new(use_case));
        }
        raw.steps
            .insert((use_case.to_string(), scenario.name.clone()), steps);
        let scenarios = raw.scenarios.entry(use_case.to_string()).or_default();
        match scenarios.iter_mut().find(|s| s.name == scenario.name) {
            Some(existing) => *existing = scenario,
            None => scenarios.push(scenario),
        }
    }

    /// Remove a scenario and its steps. Returns whether it existed.
    pub fn remove_scenario(&self, build: &BuildKey, use_case: &str, scenario: &str) -> bool {
        let mut builds = self.builds.write();
        let Some(raw) = builds.get_mut(build) else {
            return false;
        };
        let removed_steps = raw
            .steps
            .remove(&(use_case.to_string(), scenario.to_string()))
            .is_some();
        if let Some(scenarios) = raw.scenarios.get_mut(use_case) {
            scenarios.retain(|s| s.name != scenario);
        }
        removed_steps
    }
}

impl RawStore for InMemoryRawStore {
    fn load_use_cases(&self, build: &BuildKey) -> Result<Vec<UseCase>, StoreError> {
        self.builds
            .read()
            .get(build)
            .map(|raw| raw.use_cases.clone())
            .ok_or_else(|| StoreError::not_found(format!("use cases of {build}")))
    }

    fn load_scenarios(&self, build: &BuildKey, use_case: &str) -> Result<Vec<Scenario>, StoreError> {
        self.builds
            .read()
            .get(build)
            .and_then(|raw| raw.scenarios.get(use_case))
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("scenarios of {build}/{use_case}")))
    }

    fn load_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Vec<Step>, StoreError> {
        self.builds
            .read()
            .get(build)
            .and_then(|raw| raw.steps.get(&(use_case.to_string(), scenario.to_string())))
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("steps of {build}/{use_case}/{scenario}")))
    }
}

/// In-memory derived store.
///
/// Records are kept as JSON values under hierarchical keys whose first two
/// segments are the branch and build, so the contents can be fingerprinted
/// and a build deleted by prefix.
#[derive(Debug, Default)]
pub struct InMemoryDerivedStore {
    records: RwLock<BTreeMap<Vec<String>, Value>>,
}

impl InMemoryDerivedStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(build: &BuildKey, parts: &[&str]) -> Vec<String> {
        let mut key = Vec::with_capacity(parts.len() + 2);
        key.push(build.branch.clone());
        key.push(build.build.clone());
        key.extend(parts.iter().map(|p| p.to_string()));
        key
    }

    fn put<T: Serialize>(&self, key: Vec<String>, record: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.records.write().insert(key, value);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &[String]) -> Result<Option<T>, StoreError> {
        let value = self.records.read().get(key).cloned();
        match value {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// Number of records stored for a build.
    pub fn num_records(&self, build: &BuildKey) -> usize {
        self.records
            .read()
            .keys()
            .filter(|k| k[0] == build.branch && k[1] == build.build)
            .count()
    }

    /// Fingerprint of every record of a build, stamp included.
    ///
    /// Two aggregations of the same raw input yield the same fingerprint.
    pub fn fingerprint(&self, build: &BuildKey) -> Result<String, StoreError> {
        let records = self.records.read();
        let entries: Vec<(&Vec<String>, &Value)> = records
            .iter()
            .filter(|(k, _)| k[0] == build.branch && k[1] == build.build)
            .collect();
        Ok(canonical_hash_hex(&entries)?)
    }
}

impl DerivedStore for InMemoryDerivedStore {
    fn load_version(&self, build: &BuildKey) -> Result<Option<String>, StoreError> {
        self.get(&Self::key(build, &["version"]))
    }

    fn save_version(&self, build: &BuildKey, version: &str) -> Result<(), StoreError> {
        self.put(Self::key(build, &["version"]), &version)
    }

    fn delete_derived(&self, build: &BuildKey) -> Result<(), StoreError> {
        self.records
            .write()
            .retain(|k, _| !(k[0] == build.branch && k[1] == build.build));
        Ok(())
    }

    fn save_use_case_scenarios_list(
        &self,
        build: &BuildKey,
        list: &UseCaseScenariosList,
    ) -> Result<(), StoreError> {
        self.put(Self::key(build, &["usecases"]), list)
    }

    fn load_use_case_scenarios_list(
        &self,
        build: &BuildKey,
    ) -> Result<Option<UseCaseScenariosList>, StoreError> {
        self.get(&Self::key(build, &["usecases"]))
    }

    fn save_use_case_scenarios(
        &self,
        build: &BuildKey,
        scenarios: &UseCaseScenarios,
    ) -> Result<(), StoreError> {
        let key = Self::key(build, &["usecase", &scenarios.use_case.name]);
        self.put(key, scenarios)
    }

    fn load_use_case_scenarios(
        &self,
        build: &BuildKey,
        use_case: &str,
    ) -> Result<Option<UseCaseScenarios>, StoreError> {
        self.get(&Self::key(build, &["usecase", use_case]))
    }

    fn save_scenario_page_steps(
        &self,
        build: &BuildKey,
        page_steps: &ScenarioPageSteps,
    ) -> Result<(), StoreError> {
        let key = Self::key(
            build,
            &["scenario", &page_steps.use_case.name, &page_steps.scenario.name],
        );
        self.put(key, page_steps)
    }

    fn load_scenario_page_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Option<ScenarioPageSteps>, StoreError> {
        self.get(&Self::key(build, &["scenario", use_case, scenario]))
    }

    fn save_page_variants(&self, build: &BuildKey, counters: &PageVariantsCounter) -> Result<(), StoreError> {
        self.put(Self::key(build, &["pageVariants"]), counters)
    }

    fn load_page_variants(&self, build: &BuildKey) -> Result<Option<PageVariantsCounter>, StoreError> {
        self.get(&Self::key(build, &["pageVariants"]))
    }

    fn save_long_object_names(&self, build: &BuildKey, names: &LongObjectNamesIndex) -> Result<(), StoreError> {
        self.put(Self::key(build, &["longObjectNames"]), names)
    }

    fn load_long_object_names(&self, build: &BuildKey) -> Result<Option<LongObjectNamesIndex>, StoreError> {
        self.get(&Self::key(build, &["longObjectNames"]))
    }

    fn save_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
        index: &ObjectIndex,
    ) -> Result<(), StoreError> {
        self.put(Self::key(build, &["object", object_type, key]), index)
    }

    fn load_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
    ) -> Result<Option<ObjectIndex>, StoreError> {
        self.get(&Self::key(build, &["object", object_type, key]))
    }

    fn save_object_list(&self, build: &BuildKey, list: &ObjectList) -> Result<(), StoreError> {
        self.put(Self::key(build, &["objects", &list.object_type]), list)
    }

    fn load_object_list(&self, build: &BuildKey, object_type: &str) -> Result<Option<ObjectList>, StoreError> {
        self.get(&Self::key(build, &["objects", object_type]))
    }

    fn save_object_types(&self, build: &BuildKey, types: &[String]) -> Result<(), StoreError> {
        self.put(Self::key(build, &["objectTypes"]), &types)
    }

    fn load_object_types(&self, build: &BuildKey) -> Result<Option<Vec<String>>, StoreError> {
        self.get(&Self::key(build, &["objectTypes"]))
    }
}
