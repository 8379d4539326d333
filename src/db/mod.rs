pub mod export;
pub mod pool;
pub mod queries;
pub mod store;

pub use export::{export_raw_csv, write_raw_csv};
pub use pool::create_pool;
pub use queries::{ensure_schema, PgInvoiceStore};
pub use store::InvoiceStore;
