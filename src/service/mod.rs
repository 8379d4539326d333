pub mod normalizer;
pub mod runner;
pub mod sync;

pub use normalizer::normalize_rows;
pub use runner::SyncRunner;
pub use sync::InvoiceSync;
