//! Per-scenario pagination: grouping consecutive steps by page.

use crate::types::{PageSteps, ScenarioCalculatedData, Step};

/// Group a scenario's steps into page groups.
///
/// A new group starts whenever a step's page differs from the previous
/// step's page (value equality; "no page" is its own identity). Each step
/// description gets its group index as `occurrence` and its position inside
/// the group as `relative_index`. Variant fields are cleared; they belong
/// to the chain pass.
pub fn paginate_steps(steps: &[Step]) -> Vec<PageSteps> {
    let mut groups: Vec<PageSteps> = Vec::new();
    for step in steps {
        let is_new_page = match groups.last() {
            Some(group) => group.page != step.page,
            None => true,
        };
        if is_new_page {
            groups.push(PageSteps::new(step.page.clone()));
        }

        let occurrence = groups.len() - 1;
        if let Some(group) = groups.last_mut() {
            let mut desc = step.step_description.clone();
            desc.occurrence = occurrence;
            desc.relative_index = group.steps.len();
            desc.variant_index = 0;
            desc.previous_step_variant = None;
            desc.next_step_variant = None;
            group.steps.push(desc);
        }
    }
    groups
}

/// Page and step totals of a paginated scenario.
pub fn calculated_data(groups: &[PageSteps]) -> ScenarioCalculatedData {
    ScenarioCalculatedData {
        number_of_pages: groups.len(),
        number_of_steps: groups.iter().map(|g| g.steps.len()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Page;

    fn steps(pages: &[Option<&str>]) -> Vec<Step> {
        pages
            .iter()
            .enumerate()
            .map(|(i, p)| Step::new(i, format!("step {i}"), p.map(Page::new)))
            .collect()
    }

    fn positions(groups: &[PageSteps]) -> Vec<(usize, usize, usize)> {
        groups
            .iter()
            .flat_map(|g| g.steps.iter())
            .map(|d| (d.index, d.occurrence, d.relative_index))
            .collect()
    }

    #[test]
    fn test_empty_scenario() {
        let groups = paginate_steps(&[]);
        assert!(groups.is_empty());
        assert_eq!(calculated_data(&groups), ScenarioCalculatedData::default());
    }

    #[test]
    fn test_groups_follow_page_changes() {
        let groups = paginate_steps(&steps(&[Some("a"), Some("a"), Some("b"), Some("a")]));
        assert_eq!(groups.len(), 3);
        assert_eq!(
            positions(&groups),
            vec![(0, 0, 0), (1, 0, 1), (2, 1, 0), (3, 2, 0)]
        );
        let data = calculated_data(&groups);
        assert_eq!(data.number_of_pages, 3);
        assert_eq!(data.number_of_steps, 4);
    }

    #[test]
    fn test_no_page_is_its_own_identity() {
        let groups = paginate_steps(&steps(&[None, None, Some("a"), None]));
        assert_eq!(groups.len(), 3);
        assert!(groups[0].page.is_none());
        assert_eq!(groups[0].steps.len(), 2);
        assert_eq!(groups[2].steps[0].occurrence, 2);
    }

    #[test]
    fn test_page_details_are_part_of_identity() {
        let mut raw = steps(&[Some("a"), Some("a")]);
        raw[1]
            .page
            .as_mut()
            .unwrap()
            .details
            .insert("modal".into(), crate::types::DetailValue::Boolean(true));
        let groups = paginate_steps(&raw);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_order_preserved() {
        let raw = steps(&[Some("x"), Some("y"), Some("y"), None, Some("x"), Some("x")]);
        let groups = paginate_steps(&raw);
        let flattened: Vec<usize> = groups.iter().flat_map(|g| g.steps.iter()).map(|d| d.index).collect();
        assert_eq!(flattened, (0..raw.len()).collect::<Vec<_>>());
    }
}
