//! Error types for the scrape → normalize → sync pipeline

use std::time::Duration;
use thirtyfour::error::WebDriverError;

pub type UiResult<T> = std::result::Result<T, UiError>;

/// Failures of a single page interaction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UiError {
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("click on {what} intercepted by another element")]
    Intercepted { what: String },

    #[error("element not found: {what}")]
    NotFound { what: String },

    #[error("no alert present after {waited:?}")]
    NoAlert { waited: Duration },

    #[error("webdriver error: {0}")]
    Driver(String),
}

impl UiError {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, UiError::Intercepted { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UiError::Timeout { .. })
    }
}

impl From<WebDriverError> for UiError {
    fn from(e: WebDriverError) -> Self {
        match e {
            WebDriverError::ElementClickIntercepted(_) => UiError::Intercepted { what: e.to_string() },
            other => UiError::Driver(other.to_string()),
        }
    }
}

/// Scraped table does not match the declared column map.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LayoutError {
    #[error("table #{table} not found in page")]
    MissingTable { table: String },

    #[error("table #{table} has {found} header columns, layout {layout} needs {expected}")]
    HeaderMismatch {
        table: String,
        layout: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("row {row} of #{table} has {found} cells, layout {layout} needs {expected}")]
    ShortRow {
        table: String,
        layout: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid selector {0}")]
    Selector(String),
}

/// Fatal scrape failures: the login cannot continue past these.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("could not start browser session: {0}")]
    Browser(String),

    #[error("login failed after {attempts} attempts: {source}")]
    Login { attempts: u32, source: UiError },

    #[error("navigation step '{step}' failed: {source}")]
    Navigation { step: &'static str, source: UiError },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("row {row}: invalid {field} '{value}'")]
    InvalidDate {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: non-numeric {field} '{value}'")]
    InvalidAmount {
        row: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no SII credentials found (set SII_USER_<N>/SII_PASSWORD_<N> or SII_CERT_AUTH=true)")]
    MissingCredentials,

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(StoreError::Database(e))
    }
}
