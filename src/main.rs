// Entry point and menu flow.
//
// - Option [1] fetches every sheet and replaces the loaded snapshot.
// - Option [2] prints KPI cards, year cards, top groups and the groups table
//   for the current filters.
// - Option [3] edits the filter selection.
// - Option [4] exports the current view to CSV and JSON.
use chrono::Datelike;
use meetup_dashboard::dashboard::DashboardView;
use meetup_dashboard::{
    load_snapshot, output, util, Dashboard, DashboardConfig, EventType, FilterAction, Region,
    SheetsClient, Snapshot,
};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Loaded data and filter state, kept for the whole session so filters can be
// changed without refetching.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { dashboard: None }));

struct AppState {
    dashboard: Option<Dashboard>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn prompt(label: &str) -> String {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Main Menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: fetch everything and install the new snapshot.
async fn handle_load(config: &DashboardConfig) {
    println!("Loading data from sheets...");
    let snapshot = match SheetsClient::new(config) {
        Ok(client) => load_snapshot(&client, config, chrono::Local::now().year()).await,
        Err(e) => {
            error!(error = %e, "could not build HTTP client");
            Snapshot::empty()
        }
    };
    println!(
        "Loaded {} groups and {} events across {} event years.",
        util::format_int(snapshot.groups.len() as u64),
        util::format_int(snapshot.events.len() as u64),
        snapshot.available_years.len()
    );
    if snapshot.is_empty() {
        println!("Note: no data available. Check the spreadsheet id and API key.");
    }
    println!();

    let mut st = state();
    let dashboard = st
        .dashboard
        .get_or_insert_with(|| Dashboard::new(&config.org_prefix));
    dashboard.replace_snapshot(snapshot);
}

fn current_view() -> Option<DashboardView> {
    state().dashboard.as_ref().map(Dashboard::view)
}

/// Handle option [2]: print the dashboard for the current filters.
fn handle_view() {
    let Some(view) = current_view() else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };

    output::preview_table("Overview", None, &output::kpi_rows(&view.overall), 5);

    let note = if view.used_consolidated {
        "All data, from the consolidated event sheets"
    } else {
        "Filtered"
    };
    output::preview_table(
        "Yearly Statistics",
        Some(note),
        &output::year_card_rows(&view.year_cards),
        view.year_cards.len(),
    );

    output::preview_table("Top 10 Groups by Members", None, &output::bar_rows(&view.top_by_members), 10);
    output::preview_table("Top 10 Groups by RSVPs", None, &output::bar_rows(&view.top_by_rsvps), 10);
    let groups_note = format!("{} groups, first 10 by members", view.groups.len());
    output::preview_table(
        "Groups Overview",
        Some(groups_note.as_str()),
        &output::group_rows(&view),
        10,
    );
}

fn print_selection(dashboard: &Dashboard) {
    let sel = dashboard.selection();
    let join = |items: Vec<String>| if items.is_empty() { "(all)".to_string() } else { items.join(", ") };
    println!("Regions:     {}", join(sel.regions.iter().map(|r| r.to_string()).collect()));
    println!("Event types: {}", join(sel.event_types.iter().map(|t| t.to_string()).collect()));
    println!("Groups:      {}", join(sel.groups.iter().cloned().collect()));
    println!("Search:      {}\n", if sel.search.is_empty() { "(none)" } else { sel.search.as_str() });
}

fn pick_group(view: &DashboardView) -> Option<String> {
    for (idx, name) in view.display_groups.iter().enumerate() {
        println!("[{}] {}", idx + 1, name);
    }
    let n: usize = prompt("Group number: ").parse().ok()?;
    view.display_groups.get(n.checked_sub(1)?).cloned()
}

fn pick_event_type(view: &DashboardView) -> Option<EventType> {
    for (idx, kind) in view.event_types.iter().enumerate() {
        println!("[{}] {}", idx + 1, kind);
    }
    let n: usize = prompt("Event type number: ").parse().ok()?;
    view.event_types.get(n.checked_sub(1)?).cloned()
}

/// Handle option [3]: edit filters until the user goes back.
fn handle_filters() {
    loop {
        let Some(view) = current_view() else {
            println!("Error: No data loaded. Please load the data first (option 1).\n");
            return;
        };
        if let Some(d) = state().dashboard.as_ref() {
            print_selection(d);
        }
        let regions: Vec<String> = view.available_regions.iter().map(|r| r.to_string()).collect();
        println!("[1] Toggle region ({})", regions.join("/"));
        println!("[2] Toggle group");
        println!("[3] Toggle event type");
        println!("[4] Set search term");
        println!("[5] Clear all filters");
        println!("[6] Back\n");

        let action = match read_choice().as_str() {
            "1" => match Region::parse(&prompt("Region: ")) {
                Some(r) => Some(FilterAction::ToggleRegion(r)),
                None => {
                    println!("Unknown region.\n");
                    None
                }
            },
            "2" => pick_group(&view).map(FilterAction::ToggleGroup),
            "3" => pick_event_type(&view).map(FilterAction::ToggleEventType),
            "4" => Some(FilterAction::SetSearch(prompt("Search (empty to clear): "))),
            "5" => Some(FilterAction::ClearAll),
            "6" => return,
            _ => {
                println!("Invalid choice.\n");
                None
            }
        };
        if let Some(action) = action {
            if let Some(d) = state().dashboard.as_mut() {
                d.apply(action);
            }
        }
    }
}

/// Handle option [4]: write the current view to disk.
fn handle_export() {
    let Some(view) = current_view() else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };
    let outputs = [
        ("groups_overview.csv", output::write_csv("groups_overview.csv", &output::group_rows(&view))),
        (
            "year_statistics.csv",
            output::write_csv("year_statistics.csv", &output::year_card_rows(&view.year_cards)),
        ),
        ("summary.json", output::write_json("summary.json", &output::summary(&view))),
    ];
    for (file, result) in outputs {
        match result {
            Ok(()) => println!("Exported {}", file),
            Err(e) => eprintln!("Write error ({}): {}", file, e),
        }
    }
    println!();
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meetup_dashboard=info".into()),
        )
        .init();

    let config = match DashboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration, continuing without data source");
            DashboardConfig::default()
        }
    };
    info!(
        configured = config.is_configured(),
        groups_sheets = ?config.groups_sheets,
        "configuration loaded"
    );

    handle_load(&config).await;

    loop {
        println!("Meetup Analytics Dashboard");
        println!("[1] Refresh data");
        println!("[2] View dashboard");
        println!("[3] Filters");
        println!("[4] Export reports");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&config).await,
            "2" => {
                println!();
                handle_view();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_filters(),
            "4" => handle_export(),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 5.\n"),
        }
    }
}
