use crate::dashboard::DashboardView;
use crate::types::{
    GroupBar, GroupBarRow, GroupRow, KpiRow, OverallStats, SummaryExport, YearCard, YearCardRow,
};
use crate::util::{format_growth, format_int};
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of at most `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}

pub fn kpi_rows(stats: &OverallStats) -> Vec<KpiRow> {
    let kpi = |metric: &str, value: u64| KpiRow { metric: metric.to_string(), value: format_int(value) };
    vec![
        kpi("Total Groups", stats.total_groups),
        kpi("Total Members", stats.total_members),
        kpi("Past Events", stats.total_past_events),
        kpi("Upcoming Events", stats.total_upcoming_events),
        kpi("Total RSVPs", stats.total_past_rsvps),
    ]
}

pub fn year_card_rows(cards: &[YearCard]) -> Vec<YearCardRow> {
    cards
        .iter()
        .map(|c| YearCardRow {
            year: c.year,
            total_events: format_int(c.stats.total_events),
            physical_events: format_int(c.stats.physical_events),
            online_events: format_int(c.stats.online_events),
            total_rsvps: format_int(c.stats.total_rsvps),
            yoy: format_growth(c.yoy_growth),
        })
        .collect()
}

pub fn group_rows(view: &DashboardView) -> Vec<GroupRow> {
    view.groups
        .iter()
        .map(|g| GroupRow {
            name: g.name.clone(),
            city: g.city.clone(),
            region: g.region.map(|r| r.to_string()).unwrap_or_default(),
            members: format_int(g.member_count),
            past_rsvps: format_int(g.past_rsvps),
            past_events: g.past_event_count,
            upcoming: g.upcoming_events,
        })
        .collect()
}

pub fn bar_rows(bars: &[GroupBar]) -> Vec<GroupBarRow> {
    bars.iter()
        .map(|b| GroupBarRow { name: b.name.clone(), value: format_int(b.value) })
        .collect()
}

pub fn summary(view: &DashboardView) -> SummaryExport<'_> {
    SummaryExport {
        overall: &view.overall,
        year_stats: &view.year_stats,
        available_years: &view.available_years,
        filtered_groups: view.groups.len(),
        filtered_events: view.events.len(),
        members_by_group: &view.all_by_members,
        rsvps_by_group: &view.all_by_rsvps,
    }
}
