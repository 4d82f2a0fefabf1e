//! Filter selection state and the subsets it selects.
//!
//! Selection changes go through [`reduce`], which also applies the group
//! auto-selection rules: picking regions selects exactly the groups of those
//! regions; with no region picked, a search term selects the groups whose name
//! or city matches; with neither, the group selection is cleared.

use crate::reconcile::Reconciler;
use crate::region::classify;
use crate::types::{Event, EventType, Group, Region};
use crate::util::contains_ci;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub regions: BTreeSet<Region>,
    pub groups: BTreeSet<String>,
    pub event_types: BTreeSet<EventType>,
    pub search: String,
}

impl FilterSelection {
    pub fn has_active_filters(&self) -> bool {
        !self.regions.is_empty()
            || !self.groups.is_empty()
            || !self.event_types.is_empty()
            || !self.search.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    ToggleRegion(Region),
    SetRegions(Vec<Region>),
    ToggleGroup(String),
    SetGroups(Vec<String>),
    ToggleEventType(EventType),
    SetEventTypes(Vec<EventType>),
    SetSearch(String),
    /// The group dataset was replaced by a fresh load.
    DataReloaded,
    ClearAll,
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// Apply one action to a selection.
pub fn reduce(prev: &FilterSelection, action: FilterAction, groups: &[Group]) -> FilterSelection {
    let mut next = prev.clone();
    let rederive = match action {
        FilterAction::ToggleRegion(region) => {
            if region.is_known() {
                toggle(&mut next.regions, region);
            }
            true
        }
        FilterAction::SetRegions(regions) => {
            next.regions = regions.into_iter().filter(|r| r.is_known()).collect();
            true
        }
        FilterAction::ToggleGroup(name) => {
            toggle(&mut next.groups, name);
            false
        }
        FilterAction::SetGroups(names) => {
            next.groups = names.into_iter().collect();
            false
        }
        FilterAction::ToggleEventType(kind) => {
            toggle(&mut next.event_types, kind);
            false
        }
        FilterAction::SetEventTypes(kinds) => {
            next.event_types = kinds.into_iter().collect();
            false
        }
        FilterAction::SetSearch(term) => {
            next.search = term;
            true
        }
        FilterAction::DataReloaded => true,
        FilterAction::ClearAll => {
            next = FilterSelection::default();
            false
        }
    };
    if rederive {
        next.groups = auto_selected_groups(&next, groups);
    }
    next
}

/// Group selection implied by the current regions and search term.
fn auto_selected_groups(sel: &FilterSelection, groups: &[Group]) -> BTreeSet<String> {
    if !sel.regions.is_empty() {
        groups
            .iter()
            .filter(|g| g.region.is_some_and(|r| sel.regions.contains(&r)))
            .map(|g| g.name.clone())
            .collect()
    } else if !sel.search.is_empty() {
        groups
            .iter()
            .filter(|g| contains_ci(&g.name, &sel.search) || contains_ci(&g.city, &sel.search))
            .map(|g| g.name.clone())
            .collect()
    } else {
        BTreeSet::new()
    }
}

/// Region used for filtering a group: its own tag, or its city's.
pub fn group_region(group: &Group) -> Region {
    group.region.unwrap_or_else(|| classify(&group.city))
}

pub fn filtered_groups(groups: &[Group], sel: &FilterSelection) -> Vec<Group> {
    groups
        .iter()
        .filter(|g| {
            if !sel.regions.is_empty() && !sel.regions.contains(&group_region(g)) {
                return false;
            }
            if !sel.groups.is_empty() && !sel.groups.contains(&g.name) {
                return false;
            }
            if !sel.search.is_empty() {
                return contains_ci(&g.name, &sel.search) || contains_ci(&g.city, &sel.search);
            }
            true
        })
        .cloned()
        .collect()
}

/// Events passing every active filter. Region membership is resolved per
/// event through the reconciler.
pub fn filtered_events(
    events: &[Event],
    groups: &[Group],
    sel: &FilterSelection,
    org_prefix: &str,
) -> Vec<Event> {
    let reconciler = Reconciler::new(groups, org_prefix);
    events
        .iter()
        .filter(|e| {
            if !sel.event_types.is_empty() && !sel.event_types.contains(&e.event_type) {
                return false;
            }
            if !sel.groups.is_empty() && !sel.groups.contains(&e.group_name) {
                return false;
            }
            if !sel.regions.is_empty() {
                match reconciler.effective_region(e) {
                    Some(r) if sel.regions.contains(&r) => {}
                    _ => return false,
                }
            }
            if !sel.search.is_empty() {
                return contains_ci(&e.title, &sel.search)
                    || contains_ci(&e.group_name, &sel.search)
                    || contains_ci(&e.city, &sel.search);
            }
            true
        })
        .cloned()
        .collect()
}

/// Known regions present in the data, sorted.
pub fn available_regions(groups: &[Group]) -> Vec<Region> {
    groups
        .iter()
        .map(group_region)
        .filter(|r| r.is_known())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unique group names, sorted.
pub fn available_groups(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .map(|g| g.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn available_event_types() -> Vec<EventType> {
    EventType::CANONICAL.to_vec()
}

/// Group names for the picker: limited to the selected regions when any are
/// selected, selected names first, then alphabetical.
pub fn display_groups(groups: &[Group], sel: &FilterSelection) -> Vec<String> {
    let mut names: Vec<String> = available_groups(groups)
        .into_iter()
        .filter(|name| {
            if sel.regions.is_empty() {
                return true;
            }
            groups
                .iter()
                .find(|g| &g.name == name)
                .and_then(|g| g.region)
                .is_some_and(|r| sel.regions.contains(&r))
        })
        .collect();
    names.sort_by(|a, b| {
        let a_sel = sel.groups.contains(a);
        let b_sel = sel.groups.contains(b);
        b_sel.cmp(&a_sel).then_with(|| a.cmp(b))
    });
    names
}
