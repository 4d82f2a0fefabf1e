use crate::config::DashboardConfig;
use crate::mapper::{events_sheet_name, map_events, map_groups, region_from_sheet_name, Row};
use crate::reconcile::Reconciler;
use crate::sheets::{range, SheetSource, EVENT_COLUMNS, GROUP_COLUMNS};
use crate::stats::{aggregate, consolidate};
use crate::types::{Event, Group, OverallStats, YearStatsMap};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Everything one load produced. Replaced wholesale on the next load.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub groups: Vec<Group>,
    pub events: Vec<Event>,
    /// Years with an `Events {year}` sheet, newest first.
    pub available_years: Vec<i32>,
    /// Unfiltered year buckets reduced straight from the event sheets.
    pub consolidated: Option<YearStatsMap>,
    pub overall: OverallStats,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.events.is_empty()
    }
}

/// Rows of one sheet, or no rows if the fetch failed.
async fn fetch_sheet<S: SheetSource + ?Sized>(source: &S, spreadsheet_id: &str, range: &str) -> Vec<Row> {
    match source.fetch_rows(spreadsheet_id, range).await {
        Ok(rows) => {
            info!(range, rows = rows.len(), "fetched sheet");
            rows
        }
        Err(e) => {
            error!(range, error = %e, "sheet fetch failed, using no rows");
            Vec::new()
        }
    }
}

/// Years from `current_year` down to `current_year - lookback` that have an
/// `Events {year}` sheet, newest first.
pub async fn discover_years<S: SheetSource + ?Sized>(
    source: &S,
    spreadsheet_id: &str,
    current_year: i32,
    lookback: i32,
) -> Vec<i32> {
    let names: HashSet<String> = match source.list_sheet_names(spreadsheet_id).await {
        Ok(names) => names.into_iter().collect(),
        Err(e) => {
            error!(error = %e, "listing sheets failed, no event years available");
            return Vec::new();
        }
    };
    let years: Vec<i32> = (current_year - lookback.max(0)..=current_year)
        .rev()
        .filter(|y| names.contains(&events_sheet_name(*y)))
        .collect();
    info!(?years, "available event years");
    years
}

/// Groups from every configured group sheet, tagged with the sheet's region.
pub async fn fetch_groups<S: SheetSource + ?Sized>(
    source: &S,
    spreadsheet_id: &str,
    sheets: &[String],
) -> Vec<Group> {
    let fetches = sheets.iter().map(|sheet| async move {
        let rows = fetch_sheet(source, spreadsheet_id, &range(sheet, GROUP_COLUMNS)).await;
        let region = region_from_sheet_name(sheet);
        let groups = map_groups(&rows, Some(region));
        info!(sheet = %sheet, %region, groups = groups.len(), "parsed groups");
        groups
    });
    let groups: Vec<Group> = join_all(fetches).await.into_iter().flatten().collect();
    info!(total = groups.len(), "groups fetched");
    groups
}

/// Events from `Events {year}` for each year, tagged with that year.
pub async fn fetch_events<S: SheetSource + ?Sized>(
    source: &S,
    spreadsheet_id: &str,
    years: &[i32],
) -> Vec<Event> {
    let fetches = years.iter().map(|&year| async move {
        let sheet = events_sheet_name(year);
        let rows = fetch_sheet(source, spreadsheet_id, &range(&sheet, EVENT_COLUMNS)).await;
        let events = map_events(&rows, Some(year));
        info!(sheet = %sheet, events = events.len(), "parsed events");
        events
    });
    let events: Vec<Event> = join_all(fetches).await.into_iter().flatten().collect();
    info!(total = events.len(), "events fetched");
    events
}

/// Unfiltered year buckets straight from the event sheets. `None` when there
/// are no event sheets at all.
pub async fn fetch_consolidated<S: SheetSource + ?Sized>(
    source: &S,
    spreadsheet_id: &str,
    years: &[i32],
) -> Option<YearStatsMap> {
    if years.is_empty() {
        return None;
    }
    let fetches = years.iter().map(|&year| async move {
        let rows = fetch_sheet(source, spreadsheet_id, &range(&events_sheet_name(year), EVENT_COLUMNS)).await;
        (year, rows)
    });
    let sheets: Vec<(i32, Vec<Row>)> = join_all(fetches).await;
    Some(consolidate(&sheets))
}

/// Run a full load. Never fails: anything missing or broken becomes empty data.
pub async fn load_snapshot<S: SheetSource + ?Sized>(
    source: &S,
    config: &DashboardConfig,
    current_year: i32,
) -> Snapshot {
    let Some(spreadsheet_id) = config.spreadsheet_id.as_deref() else {
        warn!("spreadsheet id not configured, nothing to load");
        return Snapshot::empty();
    };
    if config.api_key.is_none() {
        warn!("sheets API key not configured, fetches will come back empty");
    }

    let groups_fut = fetch_groups(source, spreadsheet_id, &config.groups_sheets);
    let events_fut = async {
        let years = discover_years(source, spreadsheet_id, current_year, config.year_lookback).await;
        let (events, consolidated) = tokio::join!(
            fetch_events(source, spreadsheet_id, &years),
            fetch_consolidated(source, spreadsheet_id, &years),
        );
        (years, events, consolidated)
    };
    let (groups, (available_years, events, consolidated)) = tokio::join!(groups_fut, events_fut);

    Reconciler::new(&groups, &config.org_prefix).report(&events).log();
    let overall = aggregate(&groups, &events, &available_years);

    Snapshot { groups, events, available_years, consolidated, overall }
}
