//! Top-level controller: owns the current snapshot and filter selection and
//! recomputes the view on demand.

use crate::filter::{
    available_event_types, available_groups, available_regions, display_groups, filtered_events,
    filtered_groups, reduce, FilterAction, FilterSelection,
};
use crate::loader::Snapshot;
use crate::stats::{aggregate, aggregate_by_year, groups_by_members, top_groups, year_cards, GroupMetric};
use crate::types::{Event, EventType, Group, GroupBar, OverallStats, Region, YearCard, YearStatsMap};
use std::sync::Arc;
use tracing::debug;

pub const TOP_N: usize = 10;

/// Everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub groups: Vec<Group>,
    pub events: Vec<Event>,
    pub overall: OverallStats,
    pub year_stats: YearStatsMap,
    pub year_cards: Vec<YearCard>,
    pub available_years: Vec<i32>,
    pub available_regions: Vec<Region>,
    pub available_groups: Vec<String>,
    pub display_groups: Vec<String>,
    pub event_types: Vec<EventType>,
    pub top_by_members: Vec<GroupBar>,
    pub top_by_rsvps: Vec<GroupBar>,
    pub all_by_members: Vec<GroupBar>,
    pub all_by_rsvps: Vec<GroupBar>,
    /// Year stats came from the consolidated sheets rather than a recompute.
    pub used_consolidated: bool,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    snapshot: Arc<Snapshot>,
    selection: FilterSelection,
    org_prefix: String,
}

impl Dashboard {
    pub fn new(org_prefix: &str) -> Self {
        Self {
            snapshot: Arc::new(Snapshot::empty()),
            selection: FilterSelection::default(),
            org_prefix: org_prefix.to_string(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Install a freshly loaded snapshot. The last one installed wins.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
        self.apply(FilterAction::DataReloaded);
    }

    pub fn apply(&mut self, action: FilterAction) {
        debug!(?action, "filter action");
        self.selection = reduce(&self.selection, action, &self.snapshot.groups);
    }

    /// Year buckets for the filtered events. With no active filters the
    /// consolidated buckets are used when the load produced them.
    fn year_stats(&self, events: &[Event]) -> (YearStatsMap, bool) {
        if !self.selection.has_active_filters() {
            if let Some(consolidated) = &self.snapshot.consolidated {
                return (consolidated.clone(), true);
            }
        }
        (aggregate_by_year(events, &self.snapshot.available_years), false)
    }

    pub fn view(&self) -> DashboardView {
        let snap = &self.snapshot;
        let groups = filtered_groups(&snap.groups, &self.selection);
        let events = filtered_events(&snap.events, &snap.groups, &self.selection, &self.org_prefix);
        let overall = aggregate(&groups, &events, &snap.available_years);
        let (year_stats, used_consolidated) = self.year_stats(&events);
        let year_cards = year_cards(&year_stats, &snap.available_years);
        let prefix = self.org_prefix.as_str();

        DashboardView {
            top_by_members: top_groups(&groups, GroupMetric::Members, Some(TOP_N), prefix),
            top_by_rsvps: top_groups(&groups, GroupMetric::PastRsvps, Some(TOP_N), prefix),
            all_by_members: top_groups(&groups, GroupMetric::Members, None, prefix),
            all_by_rsvps: top_groups(&groups, GroupMetric::PastRsvps, None, prefix),
            groups: groups_by_members(&groups),
            events,
            overall,
            year_stats,
            year_cards,
            available_years: snap.available_years.clone(),
            available_regions: available_regions(&snap.groups),
            available_groups: available_groups(&snap.groups),
            display_groups: display_groups(&snap.groups, &self.selection),
            event_types: available_event_types(),
            used_consolidated,
        }
    }
}
