//! Dashboard configuration.

use crate::reconcile::DEFAULT_ORG_PREFIX;
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Sheets API key. Without it every fetch comes back empty.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Group sheets; each name carries its region tag.
    #[serde(default = "default_groups_sheets")]
    pub groups_sheets: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Years below the current one probed for `Events {year}` sheets.
    #[serde(default = "default_year_lookback")]
    pub year_lookback: i32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_org_prefix")]
    pub org_prefix: String,
}

fn default_groups_sheets() -> Vec<String> {
    vec![
        "AMER Dashboard".to_string(),
        "EMEA Dashboard".to_string(),
        "APAC Dashboard".to_string(),
    ]
}

fn default_api_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

const fn default_year_lookback() -> i32 {
    20
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_org_prefix() -> String {
    DEFAULT_ORG_PREFIX.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            spreadsheet_id: None,
            groups_sheets: default_groups_sheets(),
            api_base_url: default_api_base_url(),
            year_lookback: default_year_lookback(),
            request_timeout_secs: default_request_timeout_secs(),
            org_prefix: default_org_prefix(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `dashboard.toml` in the working directory (optional)
    /// 2. a `.env` file, if present
    /// 3. `DASHBOARD_*` environment variables (`DASHBOARD_GROUPS_SHEETS` is a
    ///    comma separated list)
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(config::File::with_name("dashboard").required(false))
    }

    /// Load configuration from a specific file, still honouring the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path.as_ref()))
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("groups_sheets"),
            )
            .build()?;
        let parsed: Self = cfg.try_deserialize()?;
        Ok(parsed.normalized())
    }

    /// Strip stray quotes and whitespace; blank credentials count as missing.
    pub fn normalized(mut self) -> Self {
        self.groups_sheets = self
            .groups_sheets
            .iter()
            .map(|s| s.replace('"', "").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.api_key = non_blank(self.api_key);
        self.spreadsheet_id = non_blank(self.spreadsheet_id);
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.spreadsheet_id.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_unconfigured() {
        let cfg = DashboardConfig::default();
        assert!(!cfg.is_configured());
        assert_eq!(cfg.groups_sheets.len(), 3);
        assert_eq!(cfg.year_lookback, 20);
        assert_eq!(cfg.org_prefix, "Graph Database");
    }

    #[test]
    fn normalizes_sheet_list_and_blank_credentials() {
        let cfg = DashboardConfig {
            api_key: Some("  ".into()),
            spreadsheet_id: Some(" abc ".into()),
            groups_sheets: vec!["\"AMER Dashboard".into(), " ".into(), "EMEA Dashboard\"".into()],
            api_base_url: "http://localhost:8080/".into(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.spreadsheet_id.as_deref(), Some("abc"));
        assert_eq!(cfg.groups_sheets, vec!["AMER Dashboard", "EMEA Dashboard"]);
        assert_eq!(cfg.api_base_url, "http://localhost:8080");
    }

    #[test]
    fn reads_toml_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("meetup_dashboard_cfg_{}.toml", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "spreadsheet_id = \"sheet-1\"").unwrap();
        writeln!(f, "api_key = \"key-1\"").unwrap();
        writeln!(f, "groups_sheets = [\"AMER Dashboard\"]").unwrap();
        writeln!(f, "year_lookback = 5").unwrap();
        drop(f);
        let cfg = DashboardConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(cfg.is_configured());
        assert_eq!(cfg.groups_sheets, vec!["AMER Dashboard"]);
        assert_eq!(cfg.year_lookback, 5);
        assert_eq!(cfg.request_timeout_secs, 30);
    }
}
