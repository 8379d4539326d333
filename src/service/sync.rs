use crate::config::SyncMode;
use crate::db::InvoiceStore;
use crate::error::StoreError;
use crate::models::{Invoice, SyncReport};

const PROGRESS_EVERY: usize = 100;

/// Writes normalized invoices into the store, one record at a time.
pub struct InvoiceSync<'a, S: InvoiceStore + ?Sized> {
    store: &'a S,
    mode: SyncMode,
}

impl<'a, S: InvoiceStore + ?Sized> InvoiceSync<'a, S> {
    pub fn new(store: &'a S, mode: SyncMode) -> Self {
        Self { store, mode }
    }

    /// Insert unseen keys; for known keys refresh `status` (or leave them, in insert-only mode).
    pub async fn sync(&self, invoices: &[Invoice]) -> Result<SyncReport, StoreError> {
        let mut report = SyncReport::default();
        let total = invoices.len();

        for (idx, invoice) in invoices.iter().enumerate() {
            let (supplier_id, number) = invoice.key();
            let existing = self.store.count_matching(supplier_id, number).await?;

            if existing == 0 {
                self.store.insert_one(invoice).await?;
                report.inserted += 1;
            } else {
                match self.mode {
                    SyncMode::UpsertStatus => {
                        self.store
                            .update_status(supplier_id, number, &invoice.status)
                            .await?;
                        report.updated += 1;
                    }
                    SyncMode::InsertOnly => report.unchanged += 1,
                }
            }

            let done = idx + 1;
            if done % PROGRESS_EVERY == 0 || done == total {
                tracing::info!("Synced {}/{} invoices", done, total);
            }
        }

        tracing::info!(
            "Sync done: {} inserted, {} updated, {} unchanged",
            report.inserted,
            report.updated,
            report.unchanged
        );
        Ok(report)
    }
}
