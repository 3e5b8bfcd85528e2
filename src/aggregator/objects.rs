//! Object repository: which domain objects are mentioned where.
//!
//! Objects are declared through detail maps of use cases, scenarios, pages
//! and steps. Each mention is recorded against the reference path leading
//! to it:
//!
//! ```text
//! [case U]
//! [case U, scenario S]
//! [case U, scenario S, step P/o/r]
//! [case U, scenario S, step P/o/r, page P]        details of page P
//! [..., user alice]                                objects nested in alice
//! ```
//!
//! References are buffered per use case and merged into the persisted
//! per-object indices when the use case is flushed.

use std::collections::BTreeMap;

use crate::store::{DerivedStore, StoreError};
use crate::types::{
    BuildKey, Details, DetailValue, ObjectDescription, ObjectIndex, ObjectList,
    ObjectReference, Page, ReferencePath, Scenario, StepDescription,
};
use super::long_names::LongObjectNamesResolver;

/// Object type of use case path elements.
pub const CASE_TYPE: &str = "case";
/// Object type of scenario path elements.
pub const SCENARIO_TYPE: &str = "scenario";
/// Object type of step path elements.
pub const STEP_TYPE: &str = "step";
/// Object type under which pages are indexed.
pub const PAGE_TYPE: &str = "page";

/// Build-scoped index of referenced objects.
#[derive(Debug)]
pub struct ObjectRepository {
    build: BuildKey,
    names: LongObjectNamesResolver,
    /// Every object seen in the build, with merged details.
    objects: BTreeMap<ObjectReference, ObjectDescription>,
    /// References of the current use case, not yet flushed.
    case_references: BTreeMap<ObjectReference, Vec<ReferencePath>>,
}

impl ObjectRepository {
    /// Create an empty repository for one build.
    pub fn new(build: BuildKey, max_object_name_length: usize) -> Self {
        Self {
            build,
            names: LongObjectNamesResolver::new(max_object_name_length),
            objects: BTreeMap::new(),
            case_references: BTreeMap::new(),
        }
    }

    /// Create an object reference.
    pub fn create_object_reference(object_type: &str, name: &str) -> ObjectReference {
        ObjectReference::new(object_type, name)
    }

    /// Extend `parent` by one element.
    pub fn create_path(parent: &[ObjectReference], reference: ObjectReference) -> ReferencePath {
        let mut path = Vec::with_capacity(parent.len() + 1);
        path.extend_from_slice(parent);
        path.push(reference);
        path
    }

    /// Register every object mentioned in `details` against `path`.
    pub fn add_objects(&mut self, path: &[ObjectReference], details: &Details) {
        for value in details.values() {
            self.add_value(path, value);
        }
    }

    fn add_value(&mut self, path: &[ObjectReference], value: &DetailValue) {
        match value {
            DetailValue::Reference(reference) => {
                self.register(path, reference, None);
            }
            DetailValue::Object(description) => self.add_description(path, description),
            DetailValue::List(items) => {
                for item in items {
                    self.add_value(path, item);
                }
            }
            DetailValue::Text(_) | DetailValue::Integer(_) | DetailValue::Boolean(_) => {}
        }
    }

    /// Register an object description and, below it, the objects it mentions.
    pub fn add_description(&mut self, path: &[ObjectReference], description: &ObjectDescription) {
        let reference = description.reference();
        self.register(path, &reference, Some(description));
        let nested = Self::create_path(path, reference);
        self.add_objects(&nested, &description.details);
    }

    /// Path of a scenario below its use case path; registers the scenario's objects.
    pub fn add_referenced_scenario_objects(
        &mut self,
        case_path: &[ObjectReference],
        scenario: &Scenario,
    ) -> ReferencePath {
        let path = Self::create_path(case_path, ObjectReference::new(SCENARIO_TYPE, &scenario.name));
        self.add_objects(&path, &scenario.details);
        path
    }

    /// Register the page and detail objects of one aggregated step.
    pub fn add_referenced_step_objects(
        &mut self,
        scenario_path: &[ObjectReference],
        page: Option<&Page>,
        description: &StepDescription,
        details: &Details,
    ) -> ReferencePath {
        let page_name = page.map(|p| p.name.as_str()).unwrap_or("");
        let step_name = format!(
            "{}/{}/{}",
            page_name, description.occurrence, description.relative_index
        );
        let path = Self::create_path(scenario_path, ObjectReference::new(STEP_TYPE, step_name));
        if let Some(page) = page {
            let page_object = ObjectDescription {
                object_type: PAGE_TYPE.to_string(),
                name: page.name.clone(),
                details: page.details.clone(),
            };
            self.add_description(&path, &page_object);
        }
        self.add_objects(&path, details);
        path
    }

    fn register(
        &mut self,
        path: &[ObjectReference],
        reference: &ObjectReference,
        description: Option<&ObjectDescription>,
    ) {
        let object = self
            .objects
            .entry(reference.clone())
            .or_insert_with(|| ObjectDescription::new(&reference.object_type, &reference.name));
        if let Some(description) = description {
            for (key, value) in &description.details {
                object.details.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        let paths = self.case_references.entry(reference.clone()).or_default();
        if !paths.iter().any(|p| p.as_slice() == path) {
            paths.push(path.to_vec());
        }
    }

    /// Merge the current use case's references into the persisted object
    /// indices and start a new use case. Returns the number of indices written.
    pub fn update_and_save_object_indexes_for_current_case<D: DerivedStore + ?Sized>(
        &mut self,
        store: &D,
    ) -> Result<usize, StoreError> {
        let references = std::mem::take(&mut self.case_references);
        for (reference, paths) in &references {
            let key = self.names.resolve(&reference.name);
            let object = self
                .objects
                .get(reference)
                .cloned()
                .unwrap_or_else(|| ObjectDescription::new(&reference.object_type, &reference.name));

            let mut index = store
                .load_object_index(&self.build, &reference.object_type, &key)?
                .unwrap_or_else(|| ObjectIndex::new(object.clone()));
            index.object = object;
            for path in paths {
                index.add_reference(path);
            }
            store.save_object_index(&self.build, &reference.object_type, &key, &index)?;
        }
        Ok(references.len())
    }

    /// Save one list per object type plus the list of types.
    pub fn calculate_and_save_object_lists<D: DerivedStore + ?Sized>(
        &self,
        store: &D,
    ) -> Result<(), StoreError> {
        let mut lists: BTreeMap<&str, Vec<ObjectDescription>> = BTreeMap::new();
        for (reference, object) in &self.objects {
            lists
                .entry(reference.object_type.as_str())
                .or_default()
                .push(object.clone());
        }

        for (object_type, objects) in &lists {
            let list = ObjectList {
                object_type: object_type.to_string(),
                objects: objects.clone(),
            };
            store.save_object_list(&self.build, &list)?;
        }

        let types: Vec<String> = lists.keys().map(|t| t.to_string()).collect();
        store.save_object_types(&self.build, &types)
    }

    /// Long-name table built so far.
    pub fn long_names(&self) -> &LongObjectNamesResolver {
        &self.names
    }

    /// Number of distinct objects seen.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Description of an object seen in this build.
    pub fn object(&self, reference: &ObjectReference) -> Option<&ObjectDescription> {
        self.objects.get(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDerivedStore;
    use crate::types::Status;

    fn repo() -> ObjectRepository {
        ObjectRepository::new(BuildKey::new("trunk", "b1"), 100)
    }

    fn case_path() -> ReferencePath {
        ObjectRepository::create_path(&[], ObjectReference::new(CASE_TYPE, "uc"))
    }

    #[test]
    fn test_reference_only_gets_empty_description() {
        let mut repo = repo();
        let mut details = Details::new();
        details.insert("owner".into(), DetailValue::reference("user", "alice"));
        repo.add_objects(&case_path(), &details);

        let object = repo.object(&ObjectReference::new("user", "alice")).unwrap();
        assert!(object.details.is_empty());
        assert_eq!(repo.num_objects(), 1);
    }

    #[test]
    fn test_nested_objects_extend_path() {
        let mut repo = repo();
        let store = InMemoryDerivedStore::new();
        let build = BuildKey::new("trunk", "b1");

        let alice = ObjectDescription::new("user", "alice")
            .with_detail("team", DetailValue::reference("team", "core"))
            .with_detail("tags", DetailValue::List(vec![DetailValue::text("x")]));
        let mut details = Details::new();
        details.insert("actor".into(), DetailValue::Object(alice));
        repo.add_objects(&case_path(), &details);
        repo.update_and_save_object_indexes_for_current_case(&store).unwrap();

        let team = store.load_object_index(&build, "team", "core").unwrap().unwrap();
        assert_eq!(
            team.references,
            vec![vec![
                ObjectReference::new(CASE_TYPE, "uc"),
                ObjectReference::new("user", "alice"),
            ]]
        );
        let user = store.load_object_index(&build, "user", "alice").unwrap().unwrap();
        assert_eq!(user.object.details.len(), 2);
    }

    #[test]
    fn test_duplicate_registrations_are_idempotent() {
        let mut repo = repo();
        let store = InMemoryDerivedStore::new();
        let build = BuildKey::new("trunk", "b1");
        let mut details = Details::new();
        details.insert("a".into(), DetailValue::reference("user", "alice"));
        details.insert("b".into(), DetailValue::reference("user", "alice"));

        repo.add_objects(&case_path(), &details);
        repo.add_objects(&case_path(), &details);
        repo.update_and_save_object_indexes_for_current_case(&store).unwrap();

        // a second use case flush with the same path must not duplicate it
        repo.add_objects(&case_path(), &details);
        repo.update_and_save_object_indexes_for_current_case(&store).unwrap();

        let index = store.load_object_index(&build, "user", "alice").unwrap().unwrap();
        assert_eq!(index.references.len(), 1);
    }

    #[test]
    fn test_references_accumulate_across_use_cases() {
        let mut repo = repo();
        let store = InMemoryDerivedStore::new();
        let build = BuildKey::new("trunk", "b1");
        let mut details = Details::new();
        details.insert("a".into(), DetailValue::reference("user", "alice"));

        repo.add_objects(&case_path(), &details);
        repo.update_and_save_object_indexes_for_current_case(&store).unwrap();
        let other = ObjectRepository::create_path(&[], ObjectReference::new(CASE_TYPE, "uc2"));
        repo.add_objects(&other, &details);
        assert_eq!(repo.update_and_save_object_indexes_for_current_case(&store).unwrap(), 1);

        let index = store.load_object_index(&build, "user", "alice").unwrap().unwrap();
        assert_eq!(index.references.len(), 2);
    }

    #[test]
    fn test_step_objects_include_page() {
        let mut repo = repo();
        let scenario = Scenario::new("s", Status::Success);
        let scenario_path = repo.add_referenced_scenario_objects(&case_path(), &scenario);

        let mut page = Page::new("login");
        page.details.insert("form".into(), DetailValue::reference("form", "credentials"));
        let mut desc = StepDescription::new(0, "open");
        desc.occurrence = 1;
        desc.relative_index = 2;

        let path = repo.add_referenced_step_objects(&scenario_path, Some(&page), &desc, &Details::new());
        assert_eq!(path.last().unwrap(), &ObjectReference::new(STEP_TYPE, "login/1/2"));
        assert!(repo.object(&ObjectReference::new(PAGE_TYPE, "login")).is_some());
        assert!(repo.object(&ObjectReference::new("form", "credentials")).is_some());
    }

    #[test]
    fn test_object_lists_sorted_by_type_and_name() {
        let mut repo = repo();
        let store = InMemoryDerivedStore::new();
        let build = BuildKey::new("trunk", "b1");
        let mut details = Details::new();
        details.insert("1".into(), DetailValue::reference("user", "zoe"));
        details.insert("2".into(), DetailValue::reference("user", "alice"));
        details.insert("3".into(), DetailValue::reference("team", "core"));
        repo.add_objects(&case_path(), &details);
        repo.calculate_and_save_object_lists(&store).unwrap();

        let users = store.load_object_list(&build, "user").unwrap().unwrap();
        let names: Vec<_> = users.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "zoe"]);
        assert_eq!(
            store.load_object_types(&build).unwrap().unwrap(),
            vec!["team".to_string(), "user".to_string()]
        );
    }

    #[test]
    fn test_long_names_resolved_for_keys() {
        let mut repo = repo();
        let store = InMemoryDerivedStore::new();
        let build = BuildKey::new("trunk", "b1");
        let mut details = Details::new();
        details.insert("q".into(), DetailValue::reference("query", "select * from users"));
        repo.add_objects(&case_path(), &details);
        repo.update_and_save_object_indexes_for_current_case(&store).unwrap();

        let key = repo.long_names().short_name("select * from users").unwrap().to_string();
        let index = store.load_object_index(&build, "query", &key).unwrap().unwrap();
        assert_eq!(index.object.name, "select * from users");
    }
}
