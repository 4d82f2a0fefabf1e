//! Linking events to the groups that own them.
//!
//! Event sheets and group sheets are maintained separately, so an event's
//! group-name column does not always match a group exactly. Resolution runs an
//! ordered chain of matchers from most to least precise and stops at the first
//! one that matches any group; the first group it matched owns the event.

use crate::region::classify;
use crate::types::{Event, Group, Region};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

pub const DEFAULT_ORG_PREFIX: &str = "Graph Database";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchStrategy {
    /// Event group name equals group name.
    ExactName,
    /// Cities equal, ignoring case.
    ExactCity,
    /// One city contains the other, ignoring case.
    CityContainment,
    /// Names equal or contain each other once the org prefix is stripped.
    FuzzyName,
    /// Group name contains the event city.
    CityInGroupName,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStrategy::ExactName => "exact-name",
            MatchStrategy::ExactCity => "exact-city",
            MatchStrategy::CityContainment => "city-containment",
            MatchStrategy::FuzzyName => "fuzzy-name",
            MatchStrategy::CityInGroupName => "city-in-group-name",
        };
        f.write_str(s)
    }
}

/// Lowercased and prefix-stripped forms of one side of a comparison.
#[derive(Debug, Clone)]
struct Keys {
    name: String,
    name_lower: String,
    city_lower: String,
    location: String,
}

impl Keys {
    fn new(name: &str, city: &str, prefix: &str) -> Keys {
        Self {
            name: name.to_string(),
            name_lower: name.to_lowercase(),
            city_lower: city.trim().to_lowercase(),
            location: strip_org_prefix(name, prefix),
        }
    }
}

type Matcher = fn(&Keys, &Keys) -> bool;

fn exact_name(event: &Keys, group: &Keys) -> bool {
    !event.name.is_empty() && event.name == group.name
}

fn exact_city(event: &Keys, group: &Keys) -> bool {
    !event.city_lower.is_empty() && event.city_lower == group.city_lower
}

fn city_containment(event: &Keys, group: &Keys) -> bool {
    if event.city_lower.is_empty() || group.city_lower.is_empty() {
        return false;
    }
    group.city_lower.contains(&event.city_lower) || event.city_lower.contains(&group.city_lower)
}

fn fuzzy_name(event: &Keys, group: &Keys) -> bool {
    if event.location.is_empty() || group.location.is_empty() {
        return false;
    }
    group.location == event.location
        || group.location.contains(&event.location)
        || event.location.contains(&group.location)
}

fn city_in_group_name(event: &Keys, group: &Keys) -> bool {
    !event.city_lower.is_empty()
        && !event.name.is_empty()
        && group.name_lower.contains(&event.city_lower)
}

/// The cascade, most precise first. Order matters: later matchers are looser.
const CHAIN: [(MatchStrategy, Matcher); 5] = [
    (MatchStrategy::ExactName, exact_name),
    (MatchStrategy::ExactCity, exact_city),
    (MatchStrategy::CityContainment, city_containment),
    (MatchStrategy::FuzzyName, fuzzy_name),
    (MatchStrategy::CityInGroupName, city_in_group_name),
];

/// Drop a leading org prefix (any case) and a leading dash, then lowercase.
///
/// `"Graph Database - Tel Aviv"` becomes `"tel aviv"`.
pub fn strip_org_prefix(name: &str, prefix: &str) -> String {
    let mut rest = name;
    if !prefix.is_empty() {
        if let Some(head) = rest.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                rest = rest[prefix.len()..].trim_start();
            }
        }
    }
    if let Some(after_dash) = rest.strip_prefix('-') {
        rest = after_dash.trim_start();
    }
    rest.trim().to_lowercase()
}

/// Outcome of resolving one event.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'g> {
    pub group: Option<&'g Group>,
    pub strategy: Option<MatchStrategy>,
    /// Effective region; `None` when neither the group nor the city says.
    pub region: Option<Region>,
}

impl Resolution<'_> {
    pub fn found_group(&self) -> bool {
        self.group.is_some()
    }
}

pub struct Reconciler<'g> {
    groups: &'g [Group],
    group_keys: Vec<Keys>,
    prefix: String,
}

impl<'g> Reconciler<'g> {
    pub fn new(groups: &'g [Group], org_prefix: &str) -> Self {
        let group_keys = groups
            .iter()
            .map(|g| Keys::new(&g.name, &g.city, org_prefix))
            .collect();
        Self { groups, group_keys, prefix: org_prefix.to_string() }
    }

    fn event_keys(&self, event: &Event) -> Keys {
        Keys::new(&event.group_name, &event.city, &self.prefix)
    }

    /// Indices of every group a single strategy would accept for `event`.
    pub fn candidates(&self, strategy: MatchStrategy, event: &Event) -> Vec<usize> {
        let keys = self.event_keys(event);
        CHAIN
            .iter()
            .find(|(s, _)| *s == strategy)
            .map(|(_, matcher)| self.matching(&keys, *matcher))
            .unwrap_or_default()
    }

    fn matching(&self, event: &Keys, matcher: Matcher) -> Vec<usize> {
        self.group_keys
            .iter()
            .enumerate()
            .filter(|(_, g)| matcher(event, g))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Run the cascade for one event.
    pub fn resolve(&self, event: &Event) -> Resolution<'g> {
        let keys = self.event_keys(event);
        let hit = CHAIN.iter().find_map(|(strategy, matcher)| {
            self.matching(&keys, *matcher)
                .first()
                .map(|idx| (*strategy, &self.groups[*idx]))
        });
        let (strategy, group) = match hit {
            Some((s, g)) => (Some(s), Some(g)),
            None => (None, None),
        };
        Resolution { group, strategy, region: effective_region(group, event) }
    }

    pub fn effective_region(&self, event: &Event) -> Option<Region> {
        self.resolve(event).region
    }

    /// Resolve every event and collect diagnostics.
    pub fn report(&self, events: &[Event]) -> ReconcileReport {
        let mut report = ReconcileReport { total: events.len(), ..Default::default() };
        for event in events {
            let res = self.resolve(event);
            if res.found_group() {
                report.matched += 1;
                if let Some(s) = res.strategy {
                    *report.by_strategy.entry(s).or_default() += 1;
                }
            } else if !event.group_name.is_empty() {
                report.unmatched_group_names.insert(event.group_name.clone());
            }
            if res.region.is_none() {
                report.without_region += 1;
            }
        }
        report
    }
}

/// Region of the owning group when known, else the classifier's view of the
/// event city, else nothing.
fn effective_region(group: Option<&Group>, event: &Event) -> Option<Region> {
    group
        .and_then(|g| g.region)
        .filter(|r| r.is_known())
        .or_else(|| {
            if event.city.trim().is_empty() {
                return None;
            }
            Some(classify(&event.city)).filter(|r| r.is_known())
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub total: usize,
    pub matched: usize,
    pub by_strategy: BTreeMap<MatchStrategy, usize>,
    pub unmatched_group_names: BTreeSet<String>,
    pub without_region: usize,
}

impl ReconcileReport {
    pub fn unmatched(&self) -> usize {
        self.total - self.matched
    }

    pub fn log(&self) {
        info!(
            total = self.total,
            matched = self.matched,
            unmatched = self.unmatched(),
            without_region = self.without_region,
            "reconciled events with groups"
        );
        for (strategy, n) in &self.by_strategy {
            debug!(%strategy, events = n, "matched by strategy");
        }
        if !self.unmatched_group_names.is_empty() {
            debug!(names = ?self.unmatched_group_names, "no group found for event group names");
        }
    }
}
