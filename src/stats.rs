use crate::mapper::{normalize_event_type, Row, RowSet, MEETUP_TYPE, RSVP_COUNT};
use crate::types::{
    Event, EventType, Group, GroupBar, OverallStats, YearBreakdown, YearCard, YearStats,
    YearStatsMap,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Overall totals for a (possibly filtered) set of groups and events.
///
/// Member, RSVP and event totals come straight from the group rows. The
/// per-year breakdowns select events whose free-text date contains the year.
pub fn aggregate(groups: &[Group], events: &[Event], years: &[i32]) -> OverallStats {
    let mut by_year: BTreeMap<i32, YearBreakdown> = BTreeMap::new();
    for &year in years {
        let needle = year.to_string();
        let acc = by_year.entry(year).or_default();
        for e in events.iter().filter(|e| e.date.contains(&needle)) {
            acc.total_events += 1;
            acc.total_rsvps = acc.total_rsvps.saturating_add(e.rsvp_count);
            match e.event_type {
                EventType::Physical => acc.physical_events += 1,
                EventType::Online => acc.online_events += 1,
                EventType::Hybrid => acc.hybrid_events += 1,
                EventType::Other(_) => {}
            }
        }
    }

    OverallStats {
        total_groups: groups.len() as u64,
        total_members: saturating_sum(groups.iter().map(|g| g.member_count)),
        total_past_rsvps: saturating_sum(groups.iter().map(|g| g.past_rsvps)),
        total_past_events: saturating_sum(groups.iter().map(|g| g.past_event_count)),
        total_upcoming_events: saturating_sum(groups.iter().map(|g| g.upcoming_events)),
        by_year,
    }
}

// Counts from cells saturate at u64::MAX, so totals must too.
fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// One bucket per requested year, keyed by each event's sheet year tag.
/// Years without events still get an all-zero bucket.
pub fn aggregate_by_year(events: &[Event], years: &[i32]) -> YearStatsMap {
    let mut map = YearStatsMap::default();
    for &year in years {
        map.insert(year, YearStats::default());
    }
    for e in events {
        let Some(year) = e.year else { continue };
        if let Some(acc) = map.0.get_mut(&year) {
            tally(acc, &e.event_type, e.rsvp_count);
        }
    }
    map
}

fn tally(acc: &mut YearStats, event_type: &EventType, rsvps: u64) {
    acc.total_events += 1;
    acc.total_rsvps = acc.total_rsvps.saturating_add(rsvps);
    match event_type {
        EventType::Physical => acc.physical_events += 1,
        EventType::Online => acc.online_events += 1,
        _ => {}
    }
}

/// Reduce raw `Events {year}` sheets straight into year buckets without
/// building event records. Must agree with `aggregate_by_year` over the same
/// rows.
pub fn consolidate(sheets: &[(i32, Vec<Row>)]) -> YearStatsMap {
    let mut map = YearStatsMap::default();
    for (year, rows) in sheets {
        let set = RowSet::from_rows(rows);
        let mut acc = YearStats::default();
        for row in set.data {
            let kind = normalize_event_type(set.index.cell(row, MEETUP_TYPE));
            tally(&mut acc, &kind, set.index.count(row, RSVP_COUNT));
        }
        debug!(year, events = acc.total_events, "consolidated year");
        map.insert(*year, acc);
    }
    map
}

/// Percentage change in event count from `previous` to `current`.
/// `None` when the older year had no events.
pub fn yoy_growth(current: &YearStats, previous: &YearStats) -> Option<f64> {
    if previous.total_events == 0 {
        return None;
    }
    let cur = current.total_events as f64;
    let prev = previous.total_events as f64;
    Some((cur - prev) / prev * 100.0)
}

/// Cards for `years` in the given (newest first) order. Each card compares
/// against the year that follows it in the list.
pub fn year_cards(stats: &YearStatsMap, years: &[i32]) -> Vec<YearCard> {
    years
        .iter()
        .enumerate()
        .map(|(idx, &year)| {
            let current = stats.get(year).copied().unwrap_or_default();
            let yoy_growth = years
                .get(idx + 1)
                .and_then(|prev| stats.get(*prev))
                .and_then(|prev| yoy_growth(&current, prev));
            YearCard { year, stats: current, yoy_growth }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMetric {
    Members,
    PastRsvps,
}

/// Groups ranked by a metric, largest first, optionally truncated.
pub fn top_groups(
    groups: &[Group],
    metric: GroupMetric,
    limit: Option<usize>,
    org_prefix: &str,
) -> Vec<GroupBar> {
    let value = |g: &Group| match metric {
        GroupMetric::Members => g.member_count,
        GroupMetric::PastRsvps => g.past_rsvps,
    };
    let mut ranked: Vec<&Group> = groups.iter().collect();
    ranked.sort_by_key(|g| Reverse(value(*g)));
    ranked
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|g| GroupBar { name: short_group_name(&g.name, org_prefix), value: value(g) })
        .collect()
}

/// Chart label: the first `"{prefix} "` occurrence removed.
pub fn short_group_name(name: &str, org_prefix: &str) -> String {
    if org_prefix.is_empty() {
        return name.to_string();
    }
    name.replacen(&format!("{org_prefix} "), "", 1)
}

/// Groups in table order: most members first.
pub fn groups_by_members(groups: &[Group]) -> Vec<Group> {
    let mut sorted = groups.to_vec();
    sorted.sort_by_key(|g| Reverse(g.member_count));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_events;

    fn ev(date: &str, kind: EventType, rsvps: u64, year: Option<i32>) -> Event {
        Event { date: date.into(), event_type: kind, rsvp_count: rsvps, year, ..Default::default() }
    }

    fn grp(name: &str, members: u64, rsvps: u64) -> Group {
        Group {
            name: name.into(),
            member_count: members,
            past_rsvps: rsvps,
            past_event_count: 3,
            upcoming_events: 1,
            ..Default::default()
        }
    }

    #[test]
    fn aggregate_sums_group_fields() {
        let groups = vec![grp("A", 100, 40), grp("B", 50, 10)];
        let stats = aggregate(&groups, &[], &[]);
        assert_eq!(stats.total_groups, 2);
        assert_eq!(stats.total_members, 150);
        assert_eq!(stats.total_past_rsvps, 50);
        assert_eq!(stats.total_past_events, 6);
        assert_eq!(stats.total_upcoming_events, 2);
        assert!(stats.by_year.is_empty());
    }

    #[test]
    fn aggregate_year_breakdown_uses_date_substring() {
        let events = vec![
            ev("2024-03-01", EventType::Physical, 10, Some(2025)),
            ev("March 5, 2024", EventType::Hybrid, 5, None),
            ev("2025-01-10", EventType::Online, 7, Some(2024)),
            ev("Room 2024, 2025-02-02", EventType::Other("Workshop".into()), 1, None),
        ];
        let stats = aggregate(&[], &events, &[2025, 2024]);
        let y24 = stats.by_year[&2024];
        assert_eq!(y24.total_events, 3);
        assert_eq!(y24.physical_events, 1);
        assert_eq!(y24.hybrid_events, 1);
        assert_eq!(y24.online_events, 0);
        assert_eq!(y24.total_rsvps, 16);
        let y25 = stats.by_year[&2025];
        assert_eq!(y25.total_events, 2);
        assert_eq!(y25.online_events, 1);
    }

    #[test]
    fn aggregate_is_pure() {
        let groups = vec![grp("A", 1, 2)];
        let events = vec![ev("2024", EventType::Online, 3, Some(2024))];
        assert_eq!(aggregate(&groups, &events, &[2024]), aggregate(&groups, &events, &[2024]));
        assert_eq!(aggregate_by_year(&events, &[2024]), aggregate_by_year(&events, &[2024]));
    }

    #[test]
    fn by_year_fills_every_requested_year() {
        let map = aggregate_by_year(&[], &[2023, 2024]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(2023), Some(&YearStats::default()));
        assert_eq!(map.get(2024), Some(&YearStats::default()));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stats2023": {"totalEvents": 0, "physicalEvents": 0, "onlineEvents": 0, "totalRSVPs": 0},
                "stats2024": {"totalEvents": 0, "physicalEvents": 0, "onlineEvents": 0, "totalRSVPs": 0},
            })
        );
    }

    #[test]
    fn by_year_uses_sheet_tag_not_date() {
        let events = vec![
            ev("2023-12-31", EventType::Physical, 4, Some(2024)),
            ev("", EventType::Online, 6, Some(2024)),
            ev("", EventType::Hybrid, 2, Some(2024)),
            ev("2024", EventType::Online, 9, None),
            ev("", EventType::Online, 9, Some(2019)),
        ];
        let map = aggregate_by_year(&events, &[2024]);
        assert_eq!(map.len(), 1);
        let s = map.get(2024).unwrap();
        assert_eq!(s.total_events, 3);
        assert_eq!(s.physical_events, 1);
        assert_eq!(s.online_events, 1);
        assert_eq!(s.total_rsvps, 12);
    }

    #[test]
    fn consolidate_matches_aggregate_by_year() {
        let rows = |data: &[[&str; 3]]| -> Vec<Row> {
            let mut out = vec![vec!["Meetup Title".to_string(), "RSVP Count".into(), "Meetup Type".into()]];
            out.extend(data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
            out
        };
        let sheets = vec![
            (2025, rows(&[["a", "10", "PHYSICAL"], ["b", "x", " online"], ["c", "3", "Meetup"]])),
            (2024, rows(&[["d", "1,000", "Hybrid"], ["e", "2", "onlıne"]])),
            (2023, Vec::new()),
        ];
        let events: Vec<Event> = sheets
            .iter()
            .flat_map(|(year, rows)| map_events(rows, Some(*year)))
            .collect();
        let consolidated = consolidate(&sheets);
        assert_eq!(consolidated, aggregate_by_year(&events, &[2025, 2024, 2023]));
        assert_eq!(consolidated.get(2025).unwrap().total_rsvps, 13);
        assert_eq!(consolidated.get(2024).unwrap().online_events, 1);
        assert_eq!(consolidated.get(2023), Some(&YearStats::default()));
    }

    #[test]
    fn oversized_counts_saturate_totals() {
        let huge = "99999999999999999999";
        let rows: Vec<Row> = vec![
            vec!["Meetup Title".into(), "RSVP Count".into(), "Meetup Type".into()],
            vec!["a".into(), huge.into(), "Online".into()],
            vec!["b".into(), "1".into(), "Online".into()],
        ];
        let events = map_events(&rows, Some(2024));
        assert_eq!(events[0].rsvp_count, u64::MAX);
        let by_year = aggregate_by_year(&events, &[2024]);
        assert_eq!(by_year.get(2024).unwrap().total_rsvps, u64::MAX);
        assert_eq!(consolidate(&[(2024, rows)]), by_year);

        let dated: Vec<Event> = events.into_iter().map(|e| Event { date: "2024-05-01".into(), ..e }).collect();
        let groups = vec![grp("A", u64::MAX, u64::MAX), grp("B", 5, 1)];
        let stats = aggregate(&groups, &dated, &[2024]);
        assert_eq!(stats.total_members, u64::MAX);
        assert_eq!(stats.total_past_rsvps, u64::MAX);
        assert_eq!(stats.total_past_events, 6);
        assert_eq!(stats.by_year[&2024].total_rsvps, u64::MAX);
    }

    #[test]
    fn yoy_growth_against_older_year() {
        let cur = YearStats { total_events: 15, ..Default::default() };
        let prev = YearStats { total_events: 10, ..Default::default() };
        assert_eq!(yoy_growth(&cur, &prev), Some(50.0));
        assert_eq!(yoy_growth(&prev, &cur).map(|g| g.round()), Some(-33.0));
        assert_eq!(yoy_growth(&cur, &YearStats::default()), None);
    }

    #[test]
    fn year_cards_compare_adjacent_years() {
        let mut map = YearStatsMap::default();
        map.insert(2025, YearStats { total_events: 12, ..Default::default() });
        map.insert(2024, YearStats { total_events: 8, ..Default::default() });
        map.insert(2023, YearStats::default());
        let cards = year_cards(&map, &[2025, 2024, 2023]);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].yoy_growth, Some(50.0));
        assert_eq!(cards[1].yoy_growth, None);
        assert_eq!(cards[2].yoy_growth, None);
        assert!(cards.iter().all(|c| c.yoy_growth.map_or(true, f64::is_finite)));
    }

    #[test]
    fn top_groups_rank_and_trim_labels() {
        let groups = vec![
            grp("Graph Database London", 50, 5),
            grp("Graph Database NYC", 100, 1),
            grp("Paris Graphs", 75, 9),
        ];
        let top = top_groups(&groups, GroupMetric::Members, Some(2), "Graph Database");
        assert_eq!(
            top,
            vec![
                GroupBar { name: "NYC".into(), value: 100 },
                GroupBar { name: "Paris Graphs".into(), value: 75 },
            ]
        );
        let all = top_groups(&groups, GroupMetric::PastRsvps, None, "Graph Database");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Paris Graphs");
        assert_eq!(all[2].name, "NYC");
    }

    #[test]
    fn table_order_is_members_descending() {
        let groups = vec![grp("A", 1, 0), grp("B", 3, 0), grp("C", 2, 0)];
        let names: Vec<_> = groups_by_members(&groups).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }
}
