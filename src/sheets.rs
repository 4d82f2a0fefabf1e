//! Read-only access to the spreadsheet that backs the dashboard.

use crate::config::DashboardConfig;
use crate::error::{Result, SheetsError};
use crate::mapper::Row;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

/// Column span read from group sheets.
pub const GROUP_COLUMNS: &str = "A:J";
/// Column span read from event sheets.
pub const EVENT_COLUMNS: &str = "A:H";

pub fn range(sheet: &str, columns: &str) -> String {
    format!("{sheet}!{columns}")
}

/// What the dashboard needs from a spreadsheet backend.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Titles of every sheet in the spreadsheet.
    async fn list_sheet_names(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    /// Cells of `range` (`"{sheet}!{columns}"`), row by row.
    async fn fetch_rows(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Row>>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets v4 client authenticated with an API key.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SheetsClient {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(SheetsError::MissingConfig("api_key"))
    }

    /// `{base}/v4/spreadsheets/{segments...}?key=…` with every segment
    /// percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        url.query_pairs_mut().append_pair("key", self.api_key()?);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, what, body = %body, "sheets request failed");
            return Err(SheetsError::Status { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn list_sheet_names(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = self.url(&[spreadsheet_id])?;
        let meta: SpreadsheetMeta = self.get_json(url, "spreadsheet metadata").await?;
        let names: Vec<String> = meta.sheets.into_iter().map(|s| s.properties.title).collect();
        debug!(sheets = ?names, "available sheets");
        Ok(names)
    }

    async fn fetch_rows(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Row>> {
        let url = self.url(&[spreadsheet_id, "values", range])?;
        debug!(range, "fetching sheet values");
        let values: ValueRange = self.get_json(url, range).await?;
        debug!(range, rows = values.values.len(), "fetched sheet values");
        Ok(values.values)
    }
}
