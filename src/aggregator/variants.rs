//! Step-variant resolver: build-wide chains of steps sharing a page.
//!
//! Every step on a page is linked to the step seen before it on the same
//! page, in traversal order (use cases, scenarios, steps as the raw store
//! returns them). When the build is complete each chain is closed into a
//! cycle, so following `next` from any step returns to it after exactly
//! `counter` hops.
//!
//! Links are [`StepIdentification`]s. Patching a step that lives in an
//! already persisted scenario is a load, mutate, save round trip against
//! the derived store.

use std::collections::BTreeMap;

use tracing::debug;

use crate::store::DerivedStore;
use crate::types::{BuildKey, PageVariantsCounter, ScenarioPageSteps, StepDescription, StepIdentification};
use super::AggregationError;

/// Running state of one page's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepVariantState {
    /// First step seen on the page.
    pub first_step: StepIdentification,
    /// Most recently seen step on the page.
    pub last_step: StepIdentification,
    /// Number of steps seen on the page.
    pub counter: usize,
}

/// Result of linking one step into its page's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLink {
    /// 1-based position of the step in the chain.
    pub variant_index: usize,
    /// Step seen before it on the same page, if any.
    pub previous: Option<StepIdentification>,
}

/// Per-page chain state for one build.
///
/// Iterates pages in name order so closing the chains is reproducible.
#[derive(Debug, Clone, Default)]
pub struct StepVariantResolver {
    states: BTreeMap<String, StepVariantState>,
}

impl StepVariantResolver {
    /// Create a resolver with no chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `current` to the chain of `page_name`.
    pub fn link_step(&mut self, page_name: &str, current: &StepIdentification) -> VariantLink {
        match self.states.get_mut(page_name) {
            Some(state) => {
                state.counter += 1;
                let previous = std::mem::replace(&mut state.last_step, current.clone());
                VariantLink {
                    variant_index: state.counter,
                    previous: Some(previous),
                }
            }
            None => {
                self.states.insert(
                    page_name.to_string(),
                    StepVariantState {
                        first_step: current.clone(),
                        last_step: current.clone(),
                        counter: 1,
                    },
                );
                VariantLink {
                    variant_index: 1,
                    previous: None,
                }
            }
        }
    }

    /// Chain state of a page.
    pub fn state(&self, page_name: &str) -> Option<&StepVariantState> {
        self.states.get(page_name)
    }

    /// Number of pages with a chain.
    pub fn num_pages(&self) -> usize {
        self.states.len()
    }

    /// Step counters by page name.
    pub fn counters(&self) -> PageVariantsCounter {
        PageVariantsCounter {
            counters: self
                .states
                .iter()
                .map(|(page, state)| (page.clone(), state.counter))
                .collect(),
        }
    }

    /// Close every chain into a cycle: the last step's `next` becomes the
    /// first step and the first step's `previous` becomes the last step.
    ///
    /// All scenarios are persisted at this point, so both endpoints are
    /// patched through the store.
    pub fn close_chains<D: DerivedStore + ?Sized>(
        &self,
        store: &D,
        build: &BuildKey,
    ) -> Result<(), AggregationError> {
        for (page, state) in &self.states {
            debug!(page = %page, steps = state.counter, "closing variant chain");
            set_next_variant(store, build, None, &state.last_step, &state.first_step)?;
            set_previous_variant(store, build, None, &state.first_step, &state.last_step)?;
        }
        Ok(())
    }
}

/// Point `step`'s `next` link at `next`.
///
/// `in_progress` is the scenario currently being built; if `step` belongs
/// to it, it is patched in memory instead of through the store.
pub fn set_next_variant<D: DerivedStore + ?Sized>(
    store: &D,
    build: &BuildKey,
    in_progress: Option<&mut ScenarioPageSteps>,
    step: &StepIdentification,
    next: &StepIdentification,
) -> Result<(), AggregationError> {
    patch_step(store, build, in_progress, step, |desc| {
        desc.next_step_variant = Some(next.clone());
    })
}

/// Point `step`'s `previous` link at `previous`.
pub fn set_previous_variant<D: DerivedStore + ?Sized>(
    store: &D,
    build: &BuildKey,
    in_progress: Option<&mut ScenarioPageSteps>,
    step: &StepIdentification,
    previous: &StepIdentification,
) -> Result<(), AggregationError> {
    patch_step(store, build, in_progress, step, |desc| {
        desc.previous_step_variant = Some(previous.clone());
    })
}

fn patch_step<D, F>(
    store: &D,
    build: &BuildKey,
    in_progress: Option<&mut ScenarioPageSteps>,
    step: &StepIdentification,
    patch: F,
) -> Result<(), AggregationError>
where
    D: DerivedStore + ?Sized,
    F: FnOnce(&mut StepDescription),
{
    if let Some(current) = in_progress {
        if step.belongs_to(&current.use_case.name, &current.scenario.name) {
            let desc = current
                .step_mut(step.occurrence, step.relative_index)
                .ok_or_else(|| AggregationError::VariantTargetMissing(step.clone()))?;
            patch(desc);
            return Ok(());
        }
    }

    debug!(step = %step, "patching persisted step variant");
    let mut persisted = store
        .load_scenario_page_steps(build, &step.use_case_name, &step.scenario_name)?
        .ok_or_else(|| AggregationError::VariantTargetMissing(step.clone()))?;
    let desc = persisted
        .step_mut(step.occurrence, step.relative_index)
        .ok_or_else(|| AggregationError::VariantTargetMissing(step.clone()))?;
    patch(desc);
    store.save_scenario_page_steps(build, &persisted)?;
    Ok(())
}
