use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// Organizational region a group or event belongs to.
///
/// `Unknown` is only produced by the city classifier and is never offered as a
/// filter option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Amer,
    Apac,
    Emea,
    Unknown,
}

impl Region {
    pub const KNOWN: [Region; 3] = [Region::Amer, Region::Apac, Region::Emea];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Amer => "AMER",
            Region::Apac => "APAC",
            Region::Emea => "EMEA",
            Region::Unknown => "Unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Region::Unknown
    }

    /// Parse a region label typed by a user; only the three known regions parse.
    pub fn parse(s: &str) -> Option<Region> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AMER" => Some(Region::Amer),
            "APAC" => Some(Region::Apac),
            "EMEA" => Some(Region::Emea),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kind of meetup. Labels outside the three canonical ones are kept verbatim
/// (trimmed) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
    Physical,
    Online,
    Hybrid,
    Other(String),
}

impl EventType {
    pub const CANONICAL: [EventType; 3] = [EventType::Physical, EventType::Online, EventType::Hybrid];

    pub fn label(&self) -> &str {
        match self {
            EventType::Physical => "Physical",
            EventType::Online => "Online",
            EventType::Hybrid => "Hybrid",
            EventType::Other(s) => s,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub timestamp: String,
    pub name: String,
    pub member_count: u64,
    pub pro_join_date: String,
    pub founded_date: String,
    pub city: String,
    pub past_rsvps: u64,
    pub past_event_count: u64,
    pub upcoming_events: u64,
    pub last_event_date: String,
    pub region: Option<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub timestamp: String,
    pub title: String,
    pub url: String,
    /// Free text, never parsed as a calendar date.
    pub date: String,
    pub group_name: String,
    pub city: String,
    pub rsvp_count: u64,
    pub event_type: EventType,
    /// Year of the `Events {year}` sheet the row came from.
    pub year: Option<i32>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            timestamp: String::new(),
            title: String::new(),
            url: String::new(),
            date: String::new(),
            group_name: String::new(),
            city: String::new(),
            rsvp_count: 0,
            event_type: EventType::Other(String::new()),
            year: None,
        }
    }
}

/// Per-year bucket keyed by sheet provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStats {
    pub total_events: u64,
    pub physical_events: u64,
    pub online_events: u64,
    #[serde(rename = "totalRSVPs")]
    pub total_rsvps: u64,
}

/// Year buckets. Serializes with `stats{year}` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearStatsMap(pub BTreeMap<i32, YearStats>);

impl YearStatsMap {
    pub fn key(year: i32) -> String {
        format!("stats{year}")
    }

    pub fn get(&self, year: i32) -> Option<&YearStats> {
        self.0.get(&year)
    }

    pub fn insert(&mut self, year: i32, stats: YearStats) {
        self.0.insert(year, stats);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for YearStatsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (year, stats) in &self.0 {
            map.serialize_entry(&Self::key(*year), stats)?;
        }
        map.end()
    }
}

/// Events whose free-text date mentions a given year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearBreakdown {
    pub total_events: u64,
    pub physical_events: u64,
    pub hybrid_events: u64,
    pub online_events: u64,
    #[serde(rename = "totalRSVPs")]
    pub total_rsvps: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_groups: u64,
    pub total_members: u64,
    #[serde(rename = "totalPastRSVPs")]
    pub total_past_rsvps: u64,
    pub total_past_events: u64,
    pub total_upcoming_events: u64,
    pub by_year: BTreeMap<i32, YearBreakdown>,
}

/// One year card: that year's bucket plus growth against the next older year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCard {
    pub year: i32,
    pub stats: YearStats,
    pub yoy_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBar {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearCardRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "TotalEvents")]
    #[tabled(rename = "TotalEvents")]
    pub total_events: String,
    #[serde(rename = "PhysicalEvents")]
    #[tabled(rename = "PhysicalEvents")]
    pub physical_events: String,
    #[serde(rename = "OnlineEvents")]
    #[tabled(rename = "OnlineEvents")]
    pub online_events: String,
    #[serde(rename = "TotalRSVPs")]
    #[tabled(rename = "TotalRSVPs")]
    pub total_rsvps: String,
    #[serde(rename = "YoY")]
    #[tabled(rename = "YoY")]
    pub yoy: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupRow {
    #[serde(rename = "GroupName")]
    #[tabled(rename = "Group Name")]
    pub name: String,
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Members")]
    #[tabled(rename = "Members")]
    pub members: String,
    #[serde(rename = "PastRSVPs")]
    #[tabled(rename = "Past RSVPs")]
    pub past_rsvps: String,
    #[serde(rename = "PastEvents")]
    #[tabled(rename = "Past Events")]
    pub past_events: u64,
    #[serde(rename = "Upcoming")]
    #[tabled(rename = "Upcoming")]
    pub upcoming: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupBarRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub name: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryExport<'a> {
    pub overall: &'a OverallStats,
    pub year_stats: &'a YearStatsMap,
    pub available_years: &'a [i32],
    pub filtered_groups: usize,
    pub filtered_events: usize,
    pub members_by_group: &'a [GroupBar],
    pub rsvps_by_group: &'a [GroupBar],
}
