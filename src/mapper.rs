use crate::types::{Event, EventType, Group, Region};
use crate::util::parse_count;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One raw sheet row. Rows may be ragged.
pub type Row = Vec<String>;

// Accepted header spellings per field, tried in order. The first spelling
// whose cell is non-empty wins.
pub const TIMESTAMP: &[&str] = &["Timestamp", "timestamp"];
pub const GROUP_NAME: &[&str] = &["User Group Name", "userGroupName"];
pub const MEMBER_COUNT: &[&str] = &["Member Count", "memberCount"];
pub const PRO_JOIN_DATE: &[&str] = &["Pro Join Date", "proJoinDate"];
pub const FOUNDED_DATE: &[&str] = &["Founded Date", "foundedDate"];
pub const CITY: &[&str] = &["City", "city"];
pub const PAST_RSVPS: &[&str] = &["Past RSVPs", "pastRSVPs"];
pub const PAST_EVENT_COUNT: &[&str] = &["Past Event Count", "pastEventCount"];
pub const UPCOMING_EVENTS: &[&str] = &[
    "Upcoming Events Count",
    "Upcoming Event",
    "Upcoming Events",
    "upcomingEvents",
];
pub const LAST_EVENT_DATE: &[&str] = &["Last Event Date", "lastEventDate"];

pub const MEETUP_TITLE: &[&str] = &["Meetup Title", "meetupTitle"];
pub const MEETUP_URL: &[&str] = &["Meetup URL", "meetupURL"];
pub const MEETUP_DATE: &[&str] = &["Meetup Date", "meetupDate"];
pub const MEETUP_GROUP_NAME: &[&str] = &["Meetup Group Name", "meetupGroupName"];
pub const MEETUP_CITY: &[&str] = &["Meetup City", "meetupCity"];
pub const RSVP_COUNT: &[&str] = &["RSVP Count", "rsvpCount"];
pub const MEETUP_TYPE: &[&str] = &["Meetup Type", "meetupType"];

/// Header name to column position.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &[String]) -> Self {
        let mut columns = HashMap::new();
        // A repeated header points at its last column.
        for (idx, h) in headers.iter().enumerate() {
            columns.insert(h.trim().to_string(), idx);
        }
        Self { columns }
    }

    /// First non-empty cell among the accepted spellings, or `""`.
    pub fn cell<'r>(&self, row: &'r [String], spellings: &[&str]) -> &'r str {
        spellings
            .iter()
            .filter_map(|name| self.columns.get(*name))
            .filter_map(|idx| row.get(*idx))
            .map(String::as_str)
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    pub fn count(&self, row: &[String], spellings: &[&str]) -> u64 {
        parse_count(self.cell(row, spellings))
    }

    pub fn text(&self, row: &[String], spellings: &[&str]) -> String {
        self.cell(row, spellings).to_string()
    }
}

/// Header index plus the data rows it applies to.
#[derive(Debug, Clone)]
pub struct RowSet<'a> {
    pub index: HeaderIndex,
    pub data: &'a [Row],
}

impl<'a> RowSet<'a> {
    /// Treat the first row as headers.
    pub fn from_rows(rows: &'a [Row]) -> Self {
        match rows.split_first() {
            Some((headers, data)) => Self { index: HeaderIndex::new(headers), data },
            None => Self { index: HeaderIndex::default(), data: &[] },
        }
    }

    /// Caller already knows the headers; every row is data.
    pub fn with_headers(headers: &[String], rows: &'a [Row]) -> Self {
        Self { index: HeaderIndex::new(headers), data: rows }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn groups(&self, region: Option<Region>) -> Vec<Group> {
        let ix = &self.index;
        self.data
            .iter()
            .map(|row| Group {
                timestamp: ix.text(row, TIMESTAMP),
                name: ix.text(row, GROUP_NAME),
                member_count: ix.count(row, MEMBER_COUNT),
                pro_join_date: ix.text(row, PRO_JOIN_DATE),
                founded_date: ix.text(row, FOUNDED_DATE),
                city: ix.text(row, CITY),
                past_rsvps: ix.count(row, PAST_RSVPS),
                past_event_count: ix.count(row, PAST_EVENT_COUNT),
                upcoming_events: ix.count(row, UPCOMING_EVENTS),
                last_event_date: ix.text(row, LAST_EVENT_DATE),
                region,
            })
            .collect()
    }

    pub fn events(&self, year: Option<i32>) -> Vec<Event> {
        let ix = &self.index;
        self.data
            .iter()
            .map(|row| Event {
                timestamp: ix.text(row, TIMESTAMP),
                title: ix.text(row, MEETUP_TITLE),
                url: ix.text(row, MEETUP_URL),
                date: ix.text(row, MEETUP_DATE),
                group_name: ix.text(row, MEETUP_GROUP_NAME),
                city: ix.text(row, MEETUP_CITY),
                rsvp_count: ix.count(row, RSVP_COUNT),
                event_type: normalize_event_type(ix.cell(row, MEETUP_TYPE)),
                year,
            })
            .collect()
    }
}

/// Map a group sheet (headers in the first row).
pub fn map_groups(rows: &[Row], region: Option<Region>) -> Vec<Group> {
    let set = RowSet::from_rows(rows);
    if let Some(headers) = rows.first() {
        debug!(?headers, rows = set.len(), "mapping group rows");
    }
    set.groups(region)
}

/// Map an event sheet (headers in the first row).
pub fn map_events(rows: &[Row], year: Option<i32>) -> Vec<Event> {
    let set = RowSet::from_rows(rows);
    if let Some(headers) = rows.first() {
        debug!(?headers, rows = set.len(), ?year, "mapping event rows");
    }
    set.events(year)
}

/// Case-insensitive match against the canonical labels; anything else is kept
/// trimmed as `EventType::Other`.
pub fn normalize_event_type(raw: &str) -> EventType {
    let trimmed = raw.trim();
    match trimmed.to_uppercase().as_str() {
        "PHYSICAL" => EventType::Physical,
        "ONLINE" => EventType::Online,
        "HYBRID" => EventType::Hybrid,
        _ => EventType::Other(trimmed.to_string()),
    }
}

/// Region tag encoded in a group sheet name. EMEA is checked first, then
/// APAC, then AMER; names carrying none of them default to AMER.
pub fn region_from_sheet_name(sheet: &str) -> Region {
    let upper = sheet.to_uppercase();
    if upper.contains("EMEA") {
        Region::Emea
    } else if upper.contains("APAC") {
        Region::Apac
    } else if upper.contains("AMER") {
        Region::Amer
    } else {
        warn!(sheet, "group sheet name carries no region tag, assuming AMER");
        Region::Amer
    }
}

/// First run of four consecutive ASCII digits in a sheet name.
pub fn year_from_sheet_name(sheet: &str) -> Option<i32> {
    let bytes = sheet.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|pos| sheet[pos..pos + 4].parse().ok())
}

pub fn events_sheet_name(year: i32) -> String {
    format!("Events {year}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn maps_groups_with_label_headers() {
        let rows = vec![
            row(&["Timestamp", "User Group Name", "Member Count", "City", "Past RSVPs", "Upcoming Events Count"]),
            row(&["2024-01-01", "GDB London", "1,250", "London", "300", "2"]),
        ];
        let groups = map_groups(&rows, Some(Region::Emea));
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.name, "GDB London");
        assert_eq!(g.member_count, 1250);
        assert_eq!(g.city, "London");
        assert_eq!(g.past_rsvps, 300);
        assert_eq!(g.upcoming_events, 2);
        assert_eq!(g.past_event_count, 0);
        assert_eq!(g.region, Some(Region::Emea));
    }

    #[test]
    fn falls_back_to_camel_case_headers() {
        let rows = vec![
            row(&["userGroupName", "memberCount", "city", "upcomingEvents"]),
            row(&["GDB Paris", "80", "Paris", "1"]),
        ];
        let g = &map_groups(&rows, None)[0];
        assert_eq!(g.name, "GDB Paris");
        assert_eq!(g.member_count, 80);
        assert_eq!(g.upcoming_events, 1);
        assert_eq!(g.region, None);
    }

    #[test]
    fn empty_label_cell_falls_through_to_next_spelling() {
        let rows = vec![
            row(&["Member Count", "memberCount"]),
            row(&["", "12"]),
        ];
        assert_eq!(map_groups(&rows, None)[0].member_count, 12);
    }

    #[test]
    fn ragged_and_garbage_rows_are_kept_with_defaults() {
        let rows = vec![
            row(&["Meetup Title", "Meetup Group Name", "RSVP Count", "Meetup Type", "Meetup City"]),
            row(&["Intro to graphs"]),
            row(&["Deep dive", "GDB Berlin", "lots", " online "]),
            row(&[]),
        ];
        let events = map_events(&rows, Some(2024));
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].title, "Intro to graphs");
        assert_eq!(events[0].group_name, "");
        assert_eq!(events[0].rsvp_count, 0);
        assert_eq!(events[0].event_type, EventType::Other(String::new()));
        assert_eq!(events[1].rsvp_count, 0);
        assert_eq!(events[1].event_type, EventType::Online);
        assert_eq!(events[1].city, "");
        assert!(events.iter().all(|e| e.year == Some(2024)));
    }

    #[test]
    fn known_headers_treat_every_row_as_data() {
        let headers = row(&["Meetup Title", "RSVP Count"]);
        let rows = vec![row(&["A", "3"]), row(&["B", "4"])];
        let events = RowSet::with_headers(&headers, &rows).events(None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].rsvp_count, 4);
    }

    #[test]
    fn no_rows_no_records() {
        assert!(map_groups(&[], None).is_empty());
        assert!(map_events(&[row(&["Meetup Title"])], None).is_empty());
    }

    #[test]
    fn normalizes_event_types() {
        assert_eq!(normalize_event_type("ONLINE"), EventType::Online);
        assert_eq!(normalize_event_type("physical"), EventType::Physical);
        assert_eq!(normalize_event_type(" Hybrid "), EventType::Hybrid);
        assert_eq!(
            normalize_event_type("  In-Person "),
            EventType::Other("In-Person".to_string())
        );
    }

    #[test]
    fn sheet_name_helpers() {
        assert_eq!(region_from_sheet_name("emea dashboard"), Region::Emea);
        assert_eq!(region_from_sheet_name("APAC Dashboard"), Region::Apac);
        assert_eq!(region_from_sheet_name("AMER Dashboard"), Region::Amer);
        assert_eq!(region_from_sheet_name("Groups"), Region::Amer);
        assert_eq!(year_from_sheet_name("Events 2024"), Some(2024));
        assert_eq!(year_from_sheet_name("Events"), None);
        assert_eq!(events_sheet_name(2023), "Events 2023");
    }
}
