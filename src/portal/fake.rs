//! Scripted in-memory registry used to exercise the portal flow without a browser.

use super::selectors;
use crate::browser::{Locator, PortalPage};
use crate::config::PortalTimeouts;
use crate::error::{UiError, UiResult};
use crate::models::{Category, Section};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

const SECTIONS: [Section; 2] = [Section::Accepted, Section::Pending];

#[derive(Default)]
struct FakeState {
    present: HashSet<Locator>,
    rut_options: Vec<String>,
    selected_rut: Option<String>,
    active_section: Option<Section>,
    tables: HashMap<(String, Category), Vec<String>>,
    counts: HashMap<(String, Category), String>,
    click_failures: HashMap<Locator, VecDeque<UiError>>,
    broken_ruts: HashSet<String>,
    current_html: Option<String>,
    /// Pages of the detail table currently open and the index being shown.
    pages: Vec<String>,
    page_index: usize,
    /// Row reads that still see the previous page after a "next" click.
    redraw_lag: usize,
    stale_reads: usize,
    alert_failures: usize,
    log: Vec<String>,
}

impl FakeState {
    fn rut(&self) -> Option<&String> {
        self.selected_rut.as_ref()
    }

    fn tab_section(&self, target: &Locator) -> Option<Section> {
        SECTIONS.into_iter().find(|s| selectors::section_tab(*s) == *target)
    }

    fn link_category(&self, target: &Locator) -> Option<Category> {
        Category::ALL.into_iter().find(|c| {
            Some(c.section) == self.active_section && selectors::category_link(*c) == *target
        })
    }

    fn count_category(&self, target: &Locator) -> Option<Category> {
        Category::ALL.into_iter().find(|c| {
            Some(c.section) == self.active_section && selectors::category_count(*c) == *target
        })
    }

    fn is_detail_control(&self, target: &Locator) -> bool {
        *target == selectors::BACK_BUTTON
            || SECTIONS
                .into_iter()
                .any(|s| selectors::page_size_select(s.table_id()) == *target)
    }

    fn is_rows(&self, target: &Locator) -> bool {
        SECTIONS
            .into_iter()
            .any(|s| selectors::table_rows(s.table_id()) == *target)
    }

    fn is_next(&self, target: &Locator) -> bool {
        SECTIONS
            .into_iter()
            .any(|s| selectors::next_page(s.table_id()) == *target)
    }

    fn has_next_page(&self) -> bool {
        self.current_html.is_some() && self.page_index + 1 < self.pages.len()
    }

    /// First-row text as the browser would report it, honouring the redraw lag.
    fn read_rows_text(&mut self) -> Option<String> {
        let shown = self.current_html.clone();
        if self.stale_reads > 0 {
            self.stale_reads -= 1;
            if self.stale_reads == 0 {
                self.current_html = self.pages.get(self.page_index).cloned();
            }
        }
        shown
    }

    fn exists(&self, target: &Locator) -> bool {
        if self.present.contains(target) {
            return true;
        }
        if self.tab_section(target).is_some() {
            return self.rut().map_or(false, |r| !self.broken_ruts.contains(r));
        }
        if self.is_detail_control(target) {
            return self.current_html.is_some();
        }
        if self.is_next(target) {
            return self.has_next_page();
        }
        match (self.rut(), self.link_category(target)) {
            (Some(rut), Some(c)) => {
                let key = (rut.clone(), c);
                self.tables.contains_key(&key) || self.counts.contains_key(&key)
            }
            _ => false,
        }
    }

    fn apply_click(&mut self, target: &Locator) {
        if let Some(section) = self.tab_section(target) {
            self.active_section = Some(section);
        } else if let Some(c) = self.link_category(target) {
            let rut = self.rut().cloned().unwrap_or_default();
            self.log.push(format!("open {} {}", rut, c));
            self.pages = self.tables.get(&(rut, c)).cloned().unwrap_or_default();
            self.page_index = 0;
            self.stale_reads = 0;
            self.current_html = self.pages.first().cloned();
        } else if self.is_next(target) {
            self.page_index += 1;
            if self.redraw_lag > 0 {
                self.stale_reads = self.redraw_lag;
            } else {
                self.current_html = self.pages.get(self.page_index).cloned();
            }
        } else if *target == selectors::BACK_BUTTON {
            self.current_html = None;
            self.pages.clear();
        } else if *target == selectors::MODAL_CLOSE {
            self.present.remove(target);
        }
    }
}

pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    /// Portal with every login and menu element in place and the given RUT options.
    pub fn registry(options: &[&str]) -> Self {
        let present = [
            &selectors::RUT_INPUT,
            &selectors::PASSWORD_INPUT,
            &selectors::LOGIN_BUTTON,
            &selectors::CERTIFICATE_LINK,
            &selectors::SERVICES_MENU,
            &selectors::INVOICE_MENU,
            &selectors::REGISTRY_ACCORDION,
            &selectors::REGISTRY_ENTRY,
            &selectors::RUT_SELECT,
            &selectors::CONSULT_BUTTON,
        ]
        .into_iter()
        .cloned()
        .collect();

        Self {
            state: Mutex::new(FakeState {
                present,
                rut_options: options.iter().map(|s| s.to_string()).collect(),
                ..FakeState::default()
            }),
        }
    }

    pub fn timeouts(&self) -> PortalTimeouts {
        PortalTimeouts {
            element: Duration::ZERO,
            category: Duration::ZERO,
            poll_interval: Duration::ZERO,
            login_backoff: Duration::ZERO,
        }
    }

    pub fn with_table(&self, rut: &str, category: Category, html: String) {
        self.with_pages(rut, category, vec![html]);
    }

    /// Detail table split over several pages; "next" is enabled until the last one.
    pub fn with_pages(&self, rut: &str, category: Category, pages: Vec<String>) {
        self.lock().tables.insert((rut.to_string(), category), pages);
    }

    /// After each "next" click, this many row reads still see the previous page.
    pub fn lag_redraw(&self, reads: usize) {
        self.lock().redraw_lag = reads;
    }

    /// Next confirmation alert does not show up.
    pub fn fail_alert(&self) {
        self.lock().alert_failures += 1;
    }

    pub fn with_count(&self, rut: &str, category: Category, count: &str) {
        self.lock().counts.insert((rut.to_string(), category), count.to_string());
    }

    pub fn with_overlay(&self) {
        self.lock().present.insert(selectors::MODAL_CLOSE.clone());
    }

    /// Queue an error for the next click on `target`.
    pub fn fail_click(&self, target: &Locator, err: UiError) {
        self.lock()
            .click_failures
            .entry(target.clone())
            .or_default()
            .push_back(err);
    }

    /// Querying this RUT never renders the summary.
    pub fn break_rut(&self, rut: &str) {
        self.lock().broken_ruts.insert(rut.to_string());
    }

    pub fn remove(&self, target: &Locator) {
        self.lock().present.remove(target);
    }

    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn clicked_category(&self, rut: &str, category: Category) -> bool {
        let entry = format!("open {} {}", rut, category);
        self.lock().log.iter().any(|l| *l == entry)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn timeout(target: &Locator) -> UiError {
        UiError::Timeout {
            what: target.to_string(),
            waited: Duration::ZERO,
        }
    }
}

#[async_trait]
impl PortalPage for FakePage {
    async fn goto(&self, url: &str) -> UiResult<()> {
        self.lock().log.push(format!("goto {}", url));
        Ok(())
    }

    async fn wait_for(&self, target: &Locator, _timeout: Duration) -> UiResult<()> {
        if self.lock().exists(target) {
            Ok(())
        } else {
            Err(Self::timeout(target))
        }
    }

    async fn wait_for_count(&self, target: &Locator, min: usize, _timeout: Duration) -> UiResult<usize> {
        let s = self.lock();
        let found = if *target == selectors::RUT_OPTIONS {
            s.rut_options.len()
        } else if s.is_rows(target) {
            usize::from(s.current_html.is_some())
        } else {
            usize::from(s.exists(target))
        };
        if found >= min {
            Ok(found)
        } else {
            Err(Self::timeout(target))
        }
    }

    async fn is_present(&self, target: &Locator) -> UiResult<bool> {
        Ok(self.lock().exists(target))
    }

    async fn click(&self, target: &Locator) -> UiResult<()> {
        let mut s = self.lock();
        if let Some(err) = s.click_failures.get_mut(target).and_then(|q| q.pop_front()) {
            s.log.push(format!("click-failed {}", target));
            return Err(err);
        }
        if !s.exists(target) {
            return Err(UiError::NotFound {
                what: target.to_string(),
            });
        }
        s.log.push(format!("click {}", target));
        s.apply_click(target);
        Ok(())
    }

    async fn force_click(&self, target: &Locator) -> UiResult<()> {
        let mut s = self.lock();
        if !s.exists(target) {
            return Err(UiError::NotFound {
                what: target.to_string(),
            });
        }
        s.log.push(format!("force {}", target));
        s.apply_click(target);
        Ok(())
    }

    async fn hover_click(&self, target: &Locator) -> UiResult<()> {
        let mut s = self.lock();
        if !s.exists(target) {
            return Err(UiError::NotFound {
                what: target.to_string(),
            });
        }
        s.log.push(format!("hover {}", target));
        Ok(())
    }

    async fn type_text(&self, target: &Locator, _text: &str) -> UiResult<()> {
        let mut s = self.lock();
        if !s.exists(target) {
            return Err(UiError::NotFound {
                what: target.to_string(),
            });
        }
        s.log.push(format!("type {}", target));
        Ok(())
    }

    async fn accept_alert(&self, timeout: Duration) -> UiResult<()> {
        let mut s = self.lock();
        if s.alert_failures > 0 {
            s.alert_failures -= 1;
            return Err(UiError::NoAlert { waited: timeout });
        }
        s.log.push("accept alert".to_string());
        Ok(())
    }

    async fn option_values(&self, _select: &Locator) -> UiResult<Vec<String>> {
        Ok(self.lock().rut_options.clone())
    }

    async fn select_value(&self, select: &Locator, value: &str) -> UiResult<()> {
        let mut s = self.lock();
        s.log.push(format!("select {}={}", select, value));
        if *select == selectors::RUT_SELECT {
            s.selected_rut = Some(value.to_string());
            s.active_section = None;
            s.current_html = None;
        }
        Ok(())
    }

    async fn text_of(&self, target: &Locator) -> UiResult<String> {
        let mut s = self.lock();
        if s.is_rows(target) {
            return s.read_rows_text().ok_or_else(|| UiError::NotFound {
                what: target.to_string(),
            });
        }
        s.count_category(target)
            .zip(s.rut().cloned())
            .and_then(|(c, rut)| s.counts.get(&(rut, c)).cloned())
            .ok_or_else(|| UiError::NotFound {
                what: target.to_string(),
            })
    }

    async fn source(&self) -> UiResult<String> {
        Ok(self.lock().current_html.clone().unwrap_or_default())
    }
}
