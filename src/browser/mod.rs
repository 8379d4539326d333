pub mod locator;
pub mod page;
pub mod session;

pub use locator::Locator;
pub use page::PortalPage;
pub use session::{BrowserOptions, BrowserSession};
