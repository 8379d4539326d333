use super::Locator;
use crate::error::UiResult;
use async_trait::async_trait;
use std::time::Duration;

/// Page primitives the portal flow is written against.
///
/// `BrowserSession` implements this over WebDriver; tests drive the flow with a fake page.
#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn goto(&self, url: &str) -> UiResult<()>;

    /// Wait until the element is present and clickable.
    async fn wait_for(&self, target: &Locator, timeout: Duration) -> UiResult<()>;

    /// Wait until at least `min` elements match; returns the count seen.
    async fn wait_for_count(&self, target: &Locator, min: usize, timeout: Duration) -> UiResult<usize>;

    async fn is_present(&self, target: &Locator) -> UiResult<bool>;

    async fn click(&self, target: &Locator) -> UiResult<()>;

    /// JavaScript click, ignores overlays.
    async fn force_click(&self, target: &Locator) -> UiResult<()>;

    /// Move the pointer onto the element, then click (hover menus).
    async fn hover_click(&self, target: &Locator) -> UiResult<()>;

    async fn type_text(&self, target: &Locator, text: &str) -> UiResult<()>;

    async fn accept_alert(&self, timeout: Duration) -> UiResult<()>;

    /// `value` attribute of every option of a `<select>`.
    async fn option_values(&self, select: &Locator) -> UiResult<Vec<String>>;

    async fn select_value(&self, select: &Locator, value: &str) -> UiResult<()>;

    async fn text_of(&self, target: &Locator) -> UiResult<String>;

    /// Rendered HTML of the current page.
    async fn source(&self) -> UiResult<String>;
}
