pub mod category;
pub mod invoice;
pub mod result;

pub use category::{Category, ColumnMap, DocStatus, DocType, DocumentKind, Section};
pub use invoice::{Invoice, RawInvoiceRow};
pub use result::{LoginReport, RunSummary, Skip, SyncReport};
