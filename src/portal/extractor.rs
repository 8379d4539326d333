use super::retry::{click_or_force, RetryPolicy};
use super::selectors;
use super::table::{self, RowContext};
use crate::browser::{Locator, PortalPage};
use crate::config::PortalTimeouts;
use crate::error::{LayoutError, UiError, UiResult};
use crate::models::{Category, RawInvoiceRow, Section};
use std::fmt;
use tokio::time::{sleep, Instant};

const MAX_PAGES: usize = 50;

/// Result of visiting one category for one RUT.
#[derive(Debug)]
pub enum Extraction {
    Rows(Vec<RawInvoiceRow>),
    /// Category link never showed up for this RUT.
    NoLink,
    /// Pending count next to the link is zero.
    NothingPending,
    Failed(String),
}

#[derive(Debug)]
enum CategoryFailure {
    Ui(UiError),
    Layout(LayoutError),
}

impl From<UiError> for CategoryFailure {
    fn from(e: UiError) -> Self {
        CategoryFailure::Ui(e)
    }
}

impl From<LayoutError> for CategoryFailure {
    fn from(e: LayoutError) -> Self {
        CategoryFailure::Layout(e)
    }
}

impl fmt::Display for CategoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFailure::Ui(e) => write!(f, "{}", e),
            CategoryFailure::Layout(e) => write!(f, "{}", e),
        }
    }
}

/// Reads the detail tables behind the registry summary links.
pub struct CategoryExtractor<'a, P: PortalPage + ?Sized> {
    page: &'a P,
    timeouts: PortalTimeouts,
    overlay_retry: RetryPolicy,
}

impl<'a, P: PortalPage + ?Sized> CategoryExtractor<'a, P> {
    pub fn new(page: &'a P, timeouts: PortalTimeouts) -> Self {
        Self {
            page,
            timeouts,
            overlay_retry: RetryPolicy::intercepted_once().with_backoff(timeouts.poll_interval),
        }
    }

    /// Never fails: UI trouble inside a category is reported as `Failed` so the RUT loop goes on.
    pub async fn extract(&self, rut: &str, category: Category) -> Extraction {
        let result = match category.section {
            Section::Accepted => self.extract_accepted(rut, category).await,
            Section::Pending => self.extract_pending(rut, category).await,
        };
        result.unwrap_or_else(|e| Extraction::Failed(e.to_string()))
    }

    async fn extract_accepted(&self, rut: &str, category: Category) -> Result<Extraction, CategoryFailure> {
        let link = selectors::category_link(category);
        self.activate_tab(category.section).await?;

        if self.page.wait_for(&link, self.timeouts.category).await.is_err() {
            return Ok(Extraction::NoLink);
        }
        self.page.click(&link).await?;

        self.read_detail(rut, category).await.map(Extraction::Rows)
    }

    async fn extract_pending(&self, rut: &str, category: Category) -> Result<Extraction, CategoryFailure> {
        let link = selectors::category_link(category);
        self.activate_tab(category.section).await?;

        if self.page.wait_for(&link, self.timeouts.category).await.is_err() {
            return Ok(Extraction::NoLink);
        }

        match self.pending_count(category).await {
            Some(0) => return Ok(Extraction::NothingPending),
            Some(n) => tracing::debug!("{} pending documents in {} for RUT {}", n, category, rut),
            None => tracing::warn!("Pending count unreadable for {} (RUT {}), extracting anyway", category, rut),
        }

        let page = self.page;
        let link = &link;
        self.overlay_retry
            .run(
                &format!("open {}", category),
                || async move { page.click(link).await },
                |_| async move { dismiss_overlay(page).await },
            )
            .await?;

        self.read_detail(rut, category).await.map(Extraction::Rows)
    }

    async fn pending_count(&self, category: Category) -> Option<u64> {
        let text = self
            .page
            .text_of(&selectors::category_count(category))
            .await
            .ok()?;
        text.replace('.', "").trim().parse().ok()
    }

    async fn activate_tab(&self, section: Section) -> UiResult<()> {
        let tab = selectors::section_tab(section);
        if self.page.is_present(&tab).await? {
            click_or_force(self.page, &tab).await?;
        }
        Ok(())
    }

    /// Read all pages of the detail table, then go back to the summary even if reading failed.
    async fn read_detail(&self, rut: &str, category: Category) -> Result<Vec<RawInvoiceRow>, CategoryFailure> {
        let rows = self.read_pages(rut, category).await;
        let back = self.return_to_summary().await;
        let rows = rows?;
        back?;
        Ok(rows)
    }

    async fn read_pages(&self, rut: &str, category: Category) -> Result<Vec<RawInvoiceRow>, CategoryFailure> {
        let table_id = category.section.table_id();
        let layout = category.column_map();
        let ctx = RowContext {
            rut_holding: rut.to_string(),
            status: category.status().as_str(),
            doc_type: category.kind.doc_type().as_str(),
        };

        let page_size = selectors::page_size_select(table_id);
        self.page.wait_for(&page_size, self.timeouts.category).await?;
        self.page.select_value(&page_size, selectors::PAGE_SIZE).await?;

        let row_locator = selectors::table_rows(table_id);
        let next = selectors::next_page(table_id);
        let mut rows = Vec::new();

        for page_num in 1..=MAX_PAGES {
            self.page
                .wait_for_count(&row_locator, 1, self.timeouts.category)
                .await?;
            let html = self.page.source().await?;
            let page_rows = table::read_rows(&html, table_id, layout, &ctx)?;
            tracing::debug!("{}: page {} has {} rows", category, page_num, page_rows.len());
            rows.extend(page_rows);

            if !self.page.is_present(&next).await? {
                break;
            }
            if page_num == MAX_PAGES {
                tracing::warn!("{}: stopped at page limit {}", category, MAX_PAGES);
                break;
            }
            let first_row = self.page.text_of(&row_locator).await.unwrap_or_default();
            self.page.click(&next).await?;
            self.wait_for_redraw(&row_locator, &first_row, category).await;
        }

        Ok(rows)
    }

    /// DataTables redraws after "next" without a page load; hold off until the first row differs
    /// from the one read before the click. Gives up after the category timeout.
    async fn wait_for_redraw(&self, rows: &Locator, before: &str, category: Category) {
        let started = Instant::now();
        loop {
            if let Ok(now) = self.page.text_of(rows).await {
                if now != before {
                    return;
                }
            }
            if started.elapsed() >= self.timeouts.category {
                tracing::warn!("{}: table did not redraw after next page, reading anyway", category);
                return;
            }
            sleep(self.timeouts.poll_interval).await;
        }
    }

    async fn return_to_summary(&self) -> UiResult<()> {
        self.page
            .wait_for(&selectors::BACK_BUTTON, self.timeouts.category)
            .await?;
        click_or_force(self.page, &selectors::BACK_BUTTON).await
    }
}

/// Close the modal overlay if one is showing.
pub async fn dismiss_overlay<P: PortalPage + ?Sized>(page: &P) -> UiResult<()> {
    if page.is_present(&selectors::MODAL_CLOSE).await? {
        tracing::debug!("Dismissing modal overlay");
        page.click(&selectors::MODAL_CLOSE).await?;
    }
    Ok(())
}
