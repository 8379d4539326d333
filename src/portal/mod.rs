pub mod extractor;
pub mod flow;
pub mod navigator;
pub mod retry;
pub mod selectors;
pub mod table;

#[cfg(test)]
mod fake;

pub use extractor::{CategoryExtractor, Extraction};
pub use flow::{PortalScraper, PortalState, ScrapeOutcome};
pub use retry::RetryPolicy;
