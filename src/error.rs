/// Errors raised while talking to the sheets data source.
///
/// None of these escape a load: the loader logs them and substitutes empty
/// data for the sheet that failed.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheets API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, SheetsError>;
