//! JSON file stores.
//!
//! ## Layout
//!
//! ```text
//! <root>/<branch>/<build>/usecases.json                                raw use cases
//! <root>/<branch>/<build>/usecases/<use case>/scenarios.json           raw scenarios
//! <root>/<branch>/<build>/usecases/<use case>/<scenario>/steps.json    raw steps
//! <root>/<branch>/<build>/derived/...                                  derived records
//! ```
//!
//! Every name becomes a path segment through [`encode_segment`]. Encoded
//! segments never contain a dot, so they can neither escape their directory
//! nor collide with a fixed `*.json` file name.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::types::{
    BuildKey, UseCase, Scenario, Step,
    ScenarioPageSteps, UseCaseScenarios, UseCaseScenariosList,
    PageVariantsCounter, ObjectIndex, ObjectList, LongObjectNamesIndex,
};
use super::{RawStore, DerivedStore, StoreError};

const DERIVED_DIR: &str = "derived";
const VERSION_FILE: &str = "version.txt";

/// Encode a name as a single safe path segment.
///
/// Bytes outside `[A-Za-z0-9_-]` are percent-encoded; the mapping is
/// injective.
pub fn encode_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    out
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, record: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(record)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn build_dir(root: &Path, build: &BuildKey) -> PathBuf {
    root.join(encode_segment(&build.branch))
        .join(encode_segment(&build.build))
}

/// Raw store reading JSON files below a documentation root.
#[derive(Debug, Clone)]
pub struct FileRawStore {
    root: PathBuf,
}

impl FileRawStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn use_cases_path(&self, build: &BuildKey) -> PathBuf {
        build_dir(&self.root, build).join("usecases.json")
    }

    fn use_case_dir(&self, build: &BuildKey, use_case: &str) -> PathBuf {
        build_dir(&self.root, build)
            .join("usecases")
            .join(encode_segment(use_case))
    }

    fn scenarios_path(&self, build: &BuildKey, use_case: &str) -> PathBuf {
        self.use_case_dir(build, use_case)
            .join("scenarios.json")
    }

    fn steps_path(&self, build: &BuildKey, use_case: &str, scenario: &str) -> PathBuf {
        self.use_case_dir(build, use_case)
            .join(encode_segment(scenario))
            .join("steps.json")
    }

    /// Write the use case list of a build.
    pub fn write_use_cases(&self, build: &BuildKey, use_cases: &[UseCase]) -> Result<(), StoreError> {
        write_json(&self.use_cases_path(build), use_cases)
    }

    /// Write the scenario list of a use case.
    pub fn write_scenarios(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenarios: &[Scenario],
    ) -> Result<(), StoreError> {
        write_json(&self.scenarios_path(build, use_case), scenarios)
    }

    /// Write the steps of a scenario.
    pub fn write_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
        steps: &[Step],
    ) -> Result<(), StoreError> {
        write_json(&self.steps_path(build, use_case, scenario), steps)
    }

    fn load<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StoreError> {
        read_json(&path)?.ok_or_else(|| StoreError::not_found(path.display()))
    }
}

impl RawStore for FileRawStore {
    fn load_use_cases(&self, build: &BuildKey) -> Result<Vec<UseCase>, StoreError> {
        self.load(self.use_cases_path(build))
    }

    fn load_scenarios(&self, build: &BuildKey, use_case: &str) -> Result<Vec<Scenario>, StoreError> {
        self.load(self.scenarios_path(build, use_case))
    }

    fn load_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Vec<Step>, StoreError> {
        self.load(self.steps_path(build, use_case, scenario))
    }
}

/// Derived store writing JSON files into `<root>/<branch>/<build>/derived`.
#[derive(Debug, Clone)]
pub struct FileDerivedStore {
    root: PathBuf,
}

impl FileDerivedStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn derived_dir(&self, build: &BuildKey) -> PathBuf {
        build_dir(&self.root, build).join(DERIVED_DIR)
    }

    fn file(&self, build: &BuildKey, parts: &[&str], file: &str) -> PathBuf {
        let mut path = self.derived_dir(build);
        for part in parts {
            path.push(encode_segment(part));
        }
        path.push(format!("{}.json", encode_segment(file)));
        path
    }
}

impl DerivedStore for FileDerivedStore {
    fn load_version(&self, build: &BuildKey) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.derived_dir(build).join(VERSION_FILE)) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_version(&self, build: &BuildKey, version: &str) -> Result<(), StoreError> {
        let dir = self.derived_dir(build);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(VERSION_FILE), version)?;
        Ok(())
    }

    fn delete_derived(&self, build: &BuildKey) -> Result<(), StoreError> {
        match fs::remove_dir_all(self.derived_dir(build)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_use_case_scenarios_list(
        &self,
        build: &BuildKey,
        list: &UseCaseScenariosList,
    ) -> Result<(), StoreError> {
        write_json(&self.file(build, &[], "usecases"), list)
    }

    fn load_use_case_scenarios_list(
        &self,
        build: &BuildKey,
    ) -> Result<Option<UseCaseScenariosList>, StoreError> {
        read_json(&self.file(build, &[], "usecases"))
    }

    fn save_use_case_scenarios(
        &self,
        build: &BuildKey,
        scenarios: &UseCaseScenarios,
    ) -> Result<(), StoreError> {
        let path = self.file(build, &["usecases", &scenarios.use_case.name], "scenarios");
        write_json(&path, scenarios)
    }

    fn load_use_case_scenarios(
        &self,
        build: &BuildKey,
        use_case: &str,
    ) -> Result<Option<UseCaseScenarios>, StoreError> {
        read_json(&self.file(build, &["usecases", use_case], "scenarios"))
    }

    fn save_scenario_page_steps(
        &self,
        build: &BuildKey,
        page_steps: &ScenarioPageSteps,
    ) -> Result<(), StoreError> {
        let path = self.file(
            build,
            &["usecases", &page_steps.use_case.name, "pagesteps"],
            &page_steps.scenario.name,
        );
        write_json(&path, page_steps)
    }

    fn load_scenario_page_steps(
        &self,
        build: &BuildKey,
        use_case: &str,
        scenario: &str,
    ) -> Result<Option<ScenarioPageSteps>, StoreError> {
        read_json(&self.file(build, &["usecases", use_case, "pagesteps"], scenario))
    }

    fn save_page_variants(&self, build: &BuildKey, counters: &PageVariantsCounter) -> Result<(), StoreError> {
        write_json(&self.file(build, &[], "pageVariants"), counters)
    }

    fn load_page_variants(&self, build: &BuildKey) -> Result<Option<PageVariantsCounter>, StoreError> {
        read_json(&self.file(build, &[], "pageVariants"))
    }

    fn save_long_object_names(&self, build: &BuildKey, names: &LongObjectNamesIndex) -> Result<(), StoreError> {
        write_json(&self.file(build, &[], "longObjectNames"), names)
    }

    fn load_long_object_names(&self, build: &BuildKey) -> Result<Option<LongObjectNamesIndex>, StoreError> {
        read_json(&self.file(build, &[], "longObjectNames"))
    }

    fn save_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
        index: &ObjectIndex,
    ) -> Result<(), StoreError> {
        write_json(&self.file(build, &["objects", object_type], key), index)
    }

    fn load_object_index(
        &self,
        build: &BuildKey,
        object_type: &str,
        key: &str,
    ) -> Result<Option<ObjectIndex>, StoreError> {
        read_json(&self.file(build, &["objects", object_type], key))
    }

    fn save_object_list(&self, build: &BuildKey, list: &ObjectList) -> Result<(), StoreError> {
        write_json(&self.file(build, &["objectLists"], &list.object_type), list)
    }

    fn load_object_list(&self, build: &BuildKey, object_type: &str) -> Result<Option<ObjectList>, StoreError> {
        read_json(&self.file(build, &["objectLists"], object_type))
    }

    fn save_object_types(&self, build: &BuildKey, types: &[String]) -> Result<(), StoreError> {
        write_json(&self.file(build, &[], "objectTypes"), types)
    }

    fn load_object_types(&self, build: &BuildKey) -> Result<Option<Vec<String>>, StoreError> {
        read_json(&self.file(build, &[], "objectTypes"))
    }
}
