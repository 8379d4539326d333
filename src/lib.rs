pub mod browser;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod portal;
pub mod service;

pub use config::{AppConfig, RunMode};
pub use db::{create_pool, ensure_schema, PgInvoiceStore};
pub use error::AppError;
pub use service::SyncRunner;
