use anyhow::Context;
use clap::Parser;
use sii_invoice_sync::{create_pool, ensure_schema, AppConfig, PgInvoiceStore, RunMode, SyncRunner};
use tracing::{info, Level};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(name = "sii-invoice-sync")]
#[command(about = "Scrape supplier invoices from the SII purchase registry and sync them to the invoice store")]
struct Cli {
    /// Single credential, visible browser, DEBUG logs and a raw CSV dump
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = if cli.debug { RunMode::Debug } else { RunMode::Batch };

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Starting: sync mode {:?}, webdriver {}",
        config.sync_mode, config.browser.webdriver_url
    );

    let pool = create_pool(&config.database)
        .await
        .context("connecting to invoice store")?;
    ensure_schema(&pool).await.context("preparing invoices_supplier")?;
    let store = PgInvoiceStore::new(pool);

    let summary = SyncRunner::new(&config, &store, mode).run().await?;
    summary.log();
    Ok(())
}
