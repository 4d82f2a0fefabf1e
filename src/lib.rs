//! Meetup group and event analytics over a spreadsheet backend.
//!
//! Rows from the group and event sheets are mapped into typed records, events
//! are reconciled with the groups that own them, and totals and per-year
//! statistics are computed over whatever subset the current filters select.
//!
//! Data flow: [`sheets`] → [`mapper`] → [`reconcile`] / [`region`] →
//! [`filter`] → [`stats`], driven by [`loader`] and [`dashboard`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod mapper;
pub mod output;
pub mod reconcile;
pub mod region;
pub mod sheets;
pub mod stats;
pub mod types;
pub mod util;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardView};
pub use error::{Result, SheetsError};
pub use filter::{FilterAction, FilterSelection};
pub use loader::{load_snapshot, Snapshot};
pub use sheets::{SheetSource, SheetsClient};
pub use types::{Event, EventType, Group, OverallStats, Region, YearStats, YearStatsMap};
