use super::normalizer::normalize_rows;
use super::sync::InvoiceSync;
use crate::browser::{BrowserOptions, BrowserSession};
use crate::config::{AppConfig, LoginMethod, RunMode};
use crate::db::{export_raw_csv, InvoiceStore};
use crate::error::AppError;
use crate::models::{LoginReport, RunSummary};
use crate::portal::PortalScraper;
use std::path::{Path, PathBuf};

/// Runs scrape → normalize → sync for every configured login, one after another.
pub struct SyncRunner<'a, S: InvoiceStore + ?Sized> {
    config: &'a AppConfig,
    store: &'a S,
    mode: RunMode,
}

impl<'a, S: InvoiceStore + ?Sized> SyncRunner<'a, S> {
    pub fn new(config: &'a AppConfig, store: &'a S, mode: RunMode) -> Self {
        Self {
            config,
            store,
            mode,
        }
    }

    /// Stops at the first fatal error; the summary of the logins done so far is logged first.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let logins = self.config.logins(self.mode)?;
        tracing::info!("{} login(s) to process ({:?} mode)", logins.len(), self.mode);

        let mut summary = RunSummary::default();
        let dump_base = self.config.dump_path(self.mode);

        for login in &logins {
            let dump = dump_base
                .as_deref()
                .map(|base| dump_path_for(base, login, logins.len() > 1));

            match self.run_login(login, dump.as_deref()).await {
                Ok(report) => summary.logins.push(report),
                Err(e) => {
                    tracing::error!("Login {} aborted: {}", login.label(), e);
                    summary.log();
                    return Err(e);
                }
            }
        }

        Ok(summary)
    }

    async fn run_login(&self, login: &LoginMethod, dump: Option<&Path>) -> Result<LoginReport, AppError> {
        tracing::info!("Starting login {}", login.label());

        let mut options = BrowserOptions::new(&self.config.browser.webdriver_url, self.mode.headless());
        options.poll_interval = self.config.portal.poll_interval;
        let session = BrowserSession::open(&options).await?;

        let scraped = PortalScraper::new(&session, login, self.config.portal).run().await;
        if let Err(e) = session.close().await {
            tracing::warn!("Closing browser session failed: {}", e);
        }
        let outcome = scraped?;

        if let Some(path) = dump {
            export_raw_csv(&outcome.rows, path)?;
        }

        let invoices = normalize_rows(&outcome.rows)?;
        let sync = InvoiceSync::new(self.store, self.config.sync_mode)
            .sync(&invoices)
            .await?;

        Ok(LoginReport {
            login: login.label(),
            ruts: outcome.ruts.len(),
            rows: outcome.rows.len(),
            skipped: outcome.skipped,
            sync,
        })
    }
}

/// With several logins each one gets its own dump, suffixed with the login label.
fn dump_path_for(base: &Path, login: &LoginMethod, many: bool) -> PathBuf {
    if !many {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, login.label(), ext.to_string_lossy()),
        None => format!("{}_{}", stem, login.label()),
    };
    base.with_file_name(name)
}
