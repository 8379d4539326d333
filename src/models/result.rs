use serde::Serialize;

/// Outcome counts of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    /// Existing records left as they were (insert-only mode).
    pub unchanged: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Category or RUT that was skipped during a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub rut: String,
    pub category: Option<String>,
    pub reason: String,
}

/// Per-login line of the run summary
#[derive(Debug, Clone, Serialize)]
pub struct LoginReport {
    pub login: String,
    pub ruts: usize,
    pub rows: usize,
    pub skipped: Vec<Skip>,
    pub sync: SyncReport,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub logins: Vec<LoginReport>,
}

impl RunSummary {
    pub fn totals(&self) -> SyncReport {
        self.logins.iter().fold(SyncReport::default(), |acc, l| SyncReport {
            inserted: acc.inserted + l.sync.inserted,
            updated: acc.updated + l.sync.updated,
            unchanged: acc.unchanged + l.sync.unchanged,
        })
    }

    pub fn log(&self) {
        for l in &self.logins {
            tracing::info!(
                "{}: {} RUTs, {} rows, {} skipped, {} inserted, {} updated, {} unchanged",
                l.login,
                l.ruts,
                l.rows,
                l.skipped.len(),
                l.sync.inserted,
                l.sync.updated,
                l.sync.unchanged
            );
        }
        let totals = self.totals();
        let msg = format!(
            "Finished: {} new invoices inserted, {} updated, {} unchanged",
            totals.inserted, totals.updated, totals.unchanged
        );
        tracing::info!("{}", msg);
        println!("{}", msg);
    }
}
