use crate::error::StoreError;
use crate::models::Invoice;
use async_trait::async_trait;

/// Document store holding one record per supplier invoice.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Number of stored documents with this `(supplier_id, number)`.
    async fn count_matching(&self, supplier_id: &str, number: &str) -> Result<i64, StoreError>;

    async fn insert_one(&self, invoice: &Invoice) -> Result<(), StoreError>;

    /// Overwrite `status` on the document with this key; other fields stay as first inserted.
    async fn update_status(&self, supplier_id: &str, number: &str, status: &str) -> Result<(), StoreError>;
}
