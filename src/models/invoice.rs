use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw registry row as read from the portal table, before normalization.
///
/// Field names double as the header schema of the debug CSV dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInvoiceRow {
    pub supplier_id: String,
    pub supplier_name: String,
    pub number: String,
    pub date: String,
    pub date_accepted: Option<String>,
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
    pub exent_total: Option<String>,
    pub net_total: Option<String>,
    pub iva: Option<String>,
    pub other_tax: Option<String>,
    pub total: Option<String>,
    pub rut_holding: String,
    pub status: String,
    pub doc_type: String,
}

/// Supplier invoice document (collection `invoices_supplier`)
///
/// `(supplier_id, number)` identifies a document; only `status` changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub supplier_id: String,
    pub supplier_name: String,
    pub number: String,
    pub date: DateTime<Utc>,
    pub date_accepted: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub payment_type: String,
    pub exent_total: i64,
    pub net_total: i64,
    pub iva: i64,
    pub other_tax: i64,
    pub total: i64,
    pub rut_holding: String,
    pub status: String,
    pub doc_type: String,
}

impl Invoice {
    pub fn key(&self) -> (&str, &str) {
        (self.supplier_id.as_str(), self.number.as_str())
    }
}
