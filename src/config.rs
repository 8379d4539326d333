use crate::error::AppError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const USER_PREFIX: &str = "SII_USER_";
const PASSWORD_PREFIX: &str = "SII_PASSWORD_";
const DEBUG_DUMP_PATH: &str = "compras_df.csv";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub browser: BrowserConfig,
    pub portal: PortalTimeouts,
    pub sync_mode: SyncMode,
    pub raw_dump_path: Option<PathBuf>,
    pub certificate_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub webdriver_url: String,
}

/// Bounded waits used while driving the portal.
#[derive(Debug, Clone, Copy)]
pub struct PortalTimeouts {
    /// Navigator steps (login, menus, RUT selector).
    pub element: Duration,
    /// Per-RUT category links and table rows.
    pub category: Duration,
    pub poll_interval: Duration,
    /// Pause between login click attempts.
    pub login_backoff: Duration,
}

impl Default for PortalTimeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(20),
            category: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
            login_backoff: Duration::from_secs(2),
        }
    }
}

/// What the sync writer does with a record that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Update `status` on the stored record.
    #[default]
    UpsertStatus,
    /// Leave the stored record untouched.
    InsertOnly,
}

impl FromStr for SyncMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert_status" | "upsert" => Ok(SyncMode::UpsertStatus),
            "insert_only" | "insert" => Ok(SyncMode::InsertOnly),
            other => Err(AppError::Configuration {
                message: format!("unknown SYNC_MODE '{}'", other),
            }),
        }
    }
}

/// Batch run over every credential, or a single visible debug run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Batch,
    Debug,
}

impl RunMode {
    pub fn headless(self) -> bool {
        self == RunMode::Batch
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum LoginMethod {
    Password { rut: String, password: String },
    Certificate,
}

impl LoginMethod {
    /// Label safe for logs.
    pub fn label(&self) -> String {
        match self {
            LoginMethod::Password { rut, .. } => rut.clone(),
            LoginMethod::Certificate => "certificate".to_string(),
        }
    }
}

impl fmt::Debug for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMethod::Password { rut, .. } => f
                .debug_struct("Password")
                .field("rut", rut)
                .field("password", &"***")
                .finish(),
            LoginMethod::Certificate => f.write_str("Certificate"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` when present)
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let defaults = PortalTimeouts::default();
        let portal = PortalTimeouts {
            element: env_secs("PORTAL_TIMEOUT_SECS")?.unwrap_or(defaults.element),
            category: env_secs("CATEGORY_TIMEOUT_SECS")?.unwrap_or(defaults.category),
            ..defaults
        };

        let sync_mode = match std::env::var("SYNC_MODE") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => SyncMode::default(),
        };

        Ok(Self {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/sii_invoices".to_string()),
            },
            browser: BrowserConfig {
                webdriver_url: std::env::var("WEBDRIVER_URL")
                    .unwrap_or_else(|_| "http://localhost:9515".to_string()),
            },
            portal,
            sync_mode,
            raw_dump_path: std::env::var("RAW_DUMP_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            certificate_auth: std::env::var("SII_CERT_AUTH")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Logins to run, in order. Debug runs keep only the first one.
    pub fn logins(&self, mode: RunMode) -> Result<Vec<LoginMethod>, AppError> {
        let mut logins = if self.certificate_auth {
            vec![LoginMethod::Certificate]
        } else {
            discover_credentials(std::env::vars())
                .into_iter()
                .map(|(rut, password)| LoginMethod::Password { rut, password })
                .collect()
        };

        if logins.is_empty() {
            return Err(AppError::MissingCredentials);
        }
        if mode == RunMode::Debug {
            logins.truncate(1);
        }
        Ok(logins)
    }

    pub fn dump_path(&self, mode: RunMode) -> Option<PathBuf> {
        match (&self.raw_dump_path, mode) {
            (Some(path), _) => Some(path.clone()),
            (None, RunMode::Debug) => Some(PathBuf::from(DEBUG_DUMP_PATH)),
            (None, RunMode::Batch) => None,
        }
    }
}

fn env_secs(key: &str) -> Result<Option<Duration>, AppError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| AppError::Configuration {
                message: format!("{} must be a whole number of seconds, got '{}'", key, v),
            }),
        _ => Ok(None),
    }
}

/// Pair `SII_USER_<N>` with `SII_PASSWORD_<N>` and return username → password ordered by `N`.
/// Users without a matching password are dropped.
pub fn discover_credentials<I>(vars: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut users: Vec<(u32, String)> = Vec::new();
    let mut passwords: IndexMap<u32, String> = IndexMap::new();

    for (key, value) in vars {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        if let Some(n) = key.strip_prefix(USER_PREFIX).and_then(|s| s.parse::<u32>().ok()) {
            users.push((n, value));
        } else if let Some(n) = key
            .strip_prefix(PASSWORD_PREFIX)
            .and_then(|s| s.parse::<u32>().ok())
        {
            passwords.insert(n, value);
        }
    }

    users.sort_by_key(|(n, _)| *n);

    let mut credentials = IndexMap::new();
    for (n, user) in users {
        match passwords.get(&n) {
            Some(password) => {
                credentials.insert(user, password.clone());
            }
            None => tracing::warn!("{}{} has no matching {}{}, skipping", USER_PREFIX, n, PASSWORD_PREFIX, n),
        }
    }
    credentials
}
