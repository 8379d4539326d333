use super::extractor::{CategoryExtractor, Extraction};
use super::retry::click_or_force;
use super::{navigator, selectors};
use crate::browser::PortalPage;
use crate::config::{LoginMethod, PortalTimeouts};
use crate::error::{ScrapeError, UiResult};
use crate::models::{Category, RawInvoiceRow, Section, Skip};

/// Where the scrape of one login currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    LoggedOut,
    Navigating,
    /// About to query the RUT at this index.
    AwaitingCategoryList { rut_index: usize },
    ExtractingCategory { rut_index: usize, category_index: usize },
    Done,
}

/// Rows and skip notes collected for one login, in RUT-major, category-minor order.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub ruts: Vec<String>,
    pub rows: Vec<RawInvoiceRow>,
    pub skipped: Vec<Skip>,
}

/// Drives one authenticated session through every RUT and category.
pub struct PortalScraper<'a, P: PortalPage + ?Sized> {
    page: &'a P,
    login: &'a LoginMethod,
    timeouts: PortalTimeouts,
}

impl<'a, P: PortalPage + ?Sized> PortalScraper<'a, P> {
    pub fn new(page: &'a P, login: &'a LoginMethod, timeouts: PortalTimeouts) -> Self {
        Self {
            page,
            login,
            timeouts,
        }
    }

    pub async fn run(&self) -> Result<ScrapeOutcome, ScrapeError> {
        let extractor = CategoryExtractor::new(self.page, self.timeouts);
        let mut outcome = ScrapeOutcome::default();
        let mut state = PortalState::LoggedOut;

        loop {
            tracing::debug!("Portal state: {:?}", state);
            state = match state {
                PortalState::LoggedOut => {
                    navigator::login(self.page, self.login, &self.timeouts).await?;
                    PortalState::Navigating
                }
                PortalState::Navigating => {
                    outcome.ruts = navigator::open_registry(self.page, &self.timeouts).await?;
                    PortalState::AwaitingCategoryList { rut_index: 0 }
                }
                PortalState::AwaitingCategoryList { rut_index } => match outcome.ruts.get(rut_index) {
                    None => PortalState::Done,
                    Some(rut) => {
                        tracing::info!("Fetching invoices for RUT {}", rut);
                        match self.query_rut(rut).await {
                            Ok(()) => PortalState::ExtractingCategory {
                                rut_index,
                                category_index: 0,
                            },
                            Err(e) => {
                                tracing::warn!("Query for RUT {} failed, skipping: {}", rut, e);
                                outcome.skipped.push(Skip {
                                    rut: rut.clone(),
                                    category: None,
                                    reason: e.to_string(),
                                });
                                PortalState::AwaitingCategoryList {
                                    rut_index: rut_index + 1,
                                }
                            }
                        }
                    }
                },
                PortalState::ExtractingCategory {
                    rut_index,
                    category_index,
                } => match (outcome.ruts.get(rut_index), Category::ALL.get(category_index)) {
                    (Some(rut), Some(&category)) => {
                        let rut = rut.clone();
                        match extractor.extract(&rut, category).await {
                            Extraction::Rows(rows) => {
                                tracing::info!("RUT {}: {} rows from {}", rut, rows.len(), category);
                                outcome.rows.extend(rows);
                            }
                            Extraction::NothingPending => {
                                tracing::debug!("RUT {}: nothing pending in {}", rut, category);
                            }
                            Extraction::NoLink => {
                                tracing::info!("No {} link for RUT {}, skipping", category, rut);
                                outcome.skipped.push(Skip {
                                    rut,
                                    category: Some(category.to_string()),
                                    reason: "link not found".to_string(),
                                });
                            }
                            Extraction::Failed(reason) => {
                                tracing::warn!("RUT {}: {} failed, skipping: {}", rut, category, reason);
                                outcome.skipped.push(Skip {
                                    rut,
                                    category: Some(category.to_string()),
                                    reason,
                                });
                            }
                        }
                        PortalState::ExtractingCategory {
                            rut_index,
                            category_index: category_index + 1,
                        }
                    }
                    _ => PortalState::AwaitingCategoryList {
                        rut_index: rut_index + 1,
                    },
                },
                PortalState::Done => break,
            };
        }

        tracing::info!(
            "Scrape finished: {} RUTs, {} rows, {} skipped",
            outcome.ruts.len(),
            outcome.rows.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// Select the RUT, submit the form and wait for the summary tabs.
    async fn query_rut(&self, rut: &str) -> UiResult<()> {
        self.page.select_value(&selectors::RUT_SELECT, rut).await?;
        click_or_force(self.page, &selectors::CONSULT_BUTTON).await?;
        self.page
            .wait_for(&selectors::section_tab(Section::Accepted), self.timeouts.element)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UiError;
    use crate::models::DocumentKind;
    use std::time::Duration;
    use crate::portal::fake::FakePage;
    use crate::portal::table::fixtures::{registry_row, supplier_link, table_html};

    fn password_login() -> LoginMethod {
        LoginMethod::Password {
            rut: "12345678-9".into(),
            password: "secret".into(),
        }
    }

    fn accepted_table(rut: &str, number: &str) -> String {
        let link = supplier_link(rut, "PROVEEDOR");
        let row = registry_row(&link, number, "1.000", "190", "1.190");
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        table_html("tableCompra", 13, &[cells])
    }

    fn pending_invoice_table(number: &str) -> String {
        let link = supplier_link("96.555.444-3", "PENDIENTE SA");
        table_html(
            "tablePendiente",
            10,
            &[vec![link.as_str(), number, "03/02/2024", "", "", "0", "500", "95", "", "595"]],
        )
    }

    const ACCEPTED_INVOICE: Category = Category::new(Section::Accepted, DocumentKind::Invoice);
    const ACCEPTED_CREDIT: Category = Category::new(Section::Accepted, DocumentKind::CreditNote);
    const PENDING_INVOICE: Category = Category::new(Section::Pending, DocumentKind::Invoice);
    const PENDING_EXEMPT: Category = Category::new(Section::Pending, DocumentKind::ExemptInvoice);
    const PENDING_CREDIT: Category = Category::new(Section::Pending, DocumentKind::CreditNote);

    fn numbers(outcome: &ScrapeOutcome) -> Vec<&str> {
        outcome.rows.iter().map(|r| r.number.as_str()).collect()
    }

    #[tokio::test]
    async fn test_scrape_walks_ruts_and_categories() {
        let page = FakePage::registry(&["", "11111111-1", "22222222-2"]);
        page.with_table("11111111-1", ACCEPTED_INVOICE, accepted_table("76.123.456-7", "100"));
        page.with_table("11111111-1", PENDING_INVOICE, pending_invoice_table("7"));
        page.with_count("11111111-1", PENDING_INVOICE, "1");
        page.with_table("11111111-1", PENDING_EXEMPT, pending_invoice_table("8"));
        page.with_count("11111111-1", PENDING_EXEMPT, "0");
        page.with_table("22222222-2", ACCEPTED_CREDIT, accepted_table("77.000.111-2", "200"));

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.ruts, vec!["11111111-1", "22222222-2"]);
        let seen: Vec<_> = outcome
            .rows
            .iter()
            .map(|r| (r.rut_holding.as_str(), r.number.as_str(), r.status.as_str(), r.doc_type.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("11111111-1", "100", "accepted", "invoice"),
                ("11111111-1", "7", "pending", "invoice"),
                ("22222222-2", "200", "accepted", "credit_note"),
            ]
        );
        // zero pending count: link present but never clicked
        assert!(!page.clicked_category("11111111-1", PENDING_EXEMPT));
        // 6 categories per RUT, 3 + 5 not present
        assert_eq!(outcome.skipped.len(), 8);
        assert!(outcome.skipped.iter().all(|s| s.category.is_some()));
    }

    #[tokio::test]
    async fn test_login_failure_is_fatal() {
        let page = FakePage::registry(&["", "11111111-1"]);
        for _ in 0..3 {
            page.fail_click(&selectors::LOGIN_BUTTON, UiError::NotFound { what: "login".into() });
        }

        let login = password_login();
        let err = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Login { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_login_retry_recovers() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.fail_click(&selectors::LOGIN_BUTTON, UiError::NotFound { what: "login".into() });
        page.with_table("11111111-1", ACCEPTED_INVOICE, accepted_table("76.123.456-7", "100"));

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();
        assert_eq!(outcome.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_intercepted_pending_click_dismisses_overlay() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_table("11111111-1", PENDING_INVOICE, pending_invoice_table("7"));
        page.with_count("11111111-1", PENDING_INVOICE, "3");
        page.with_overlay();
        page.fail_click(
            &selectors::category_link(PENDING_INVOICE),
            UiError::Intercepted { what: "link".into() },
        );

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].status, "pending");
        assert!(page.log().iter().any(|l| l == &format!("click {}", selectors::MODAL_CLOSE)));
    }

    #[tokio::test]
    async fn test_intercepted_submit_forces_click() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_table("11111111-1", ACCEPTED_INVOICE, accepted_table("76.123.456-7", "100"));
        page.fail_click(&selectors::CONSULT_BUTTON, UiError::Intercepted { what: "submit".into() });

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert!(page
            .log()
            .iter()
            .any(|l| l == &format!("force {}", selectors::CONSULT_BUTTON)));
    }

    #[tokio::test]
    async fn test_rut_without_result_is_skipped() {
        let page = FakePage::registry(&["", "11111111-1", "22222222-2"]);
        page.break_rut("11111111-1");
        page.with_table("22222222-2", ACCEPTED_INVOICE, accepted_table("76.123.456-7", "100"));

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].rut_holding, "22222222-2");
        assert_eq!(outcome.skipped[0].rut, "11111111-1");
        assert_eq!(outcome.skipped[0].category, None);
    }

    #[tokio::test]
    async fn test_missing_menu_is_fatal() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.remove(&selectors::REGISTRY_ENTRY);

        let login = password_login();
        let err = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { step: "registry entry", .. }));
    }

    #[tokio::test]
    async fn test_pages_are_merged_in_order() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_pages(
            "11111111-1",
            ACCEPTED_INVOICE,
            vec![
                accepted_table("76.123.456-7", "100"),
                accepted_table("76.123.456-7", "101"),
                accepted_table("77.000.111-2", "102"),
            ],
        );

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(numbers(&outcome), vec!["100", "101", "102"]);
        let next = format!("click {}", selectors::next_page("tableCompra"));
        assert_eq!(page.log().iter().filter(|l| **l == next).count(), 2);
    }

    #[tokio::test]
    async fn test_page_limit_stops_reading() {
        let page = FakePage::registry(&["", "11111111-1"]);
        let pages = (1..=51)
            .map(|n| accepted_table("76.123.456-7", &n.to_string()))
            .collect();
        page.with_pages("11111111-1", ACCEPTED_INVOICE, pages);

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.rows.len(), 50);
        assert_eq!(outcome.rows.last().unwrap().number, "50");
    }

    #[tokio::test]
    async fn test_next_page_waits_for_redraw() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_pages(
            "11111111-1",
            ACCEPTED_INVOICE,
            vec![
                accepted_table("76.123.456-7", "100"),
                accepted_table("76.123.456-7", "101"),
            ],
        );
        page.lag_redraw(2);
        let mut timeouts = page.timeouts();
        timeouts.category = Duration::from_secs(1);

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, timeouts).run().await.unwrap();

        assert_eq!(numbers(&outcome), vec!["100", "101"]);
    }

    #[tokio::test]
    async fn test_certificate_login_reaches_registry() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_table("11111111-1", ACCEPTED_INVOICE, accepted_table("76.123.456-7", "100"));
        page.fail_alert();

        let login = LoginMethod::Certificate;
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(outcome.ruts, vec!["11111111-1"]);
        assert_eq!(numbers(&outcome), vec!["100"]);
        let log = page.log();
        let cert_click = format!("click {}", selectors::CERTIFICATE_LINK);
        assert_eq!(log.iter().filter(|l| **l == cert_click).count(), 2);
        assert!(log.iter().any(|l| l == "accept alert"));
        assert!(!log.iter().any(|l| l == &format!("type {}", selectors::PASSWORD_INPUT)));
    }

    #[tokio::test]
    async fn test_certificate_login_without_alert_is_fatal() {
        let page = FakePage::registry(&["", "11111111-1"]);
        for _ in 0..3 {
            page.fail_alert();
        }

        let login = LoginMethod::Certificate;
        let err = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Login {
                attempts: 3,
                source: UiError::NoAlert { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_layout_mismatch_skips_category() {
        let page = FakePage::registry(&["", "11111111-1"]);
        page.with_table("11111111-1", PENDING_INVOICE, pending_invoice_table("7"));
        page.with_count("11111111-1", PENDING_INVOICE, "1");
        // credit note link serves an invoice-shaped table
        page.with_table("11111111-1", PENDING_CREDIT, pending_invoice_table("8"));
        page.with_count("11111111-1", PENDING_CREDIT, "1");

        let login = password_login();
        let outcome = PortalScraper::new(&page, &login, page.timeouts()).run().await.unwrap();

        assert_eq!(numbers(&outcome), vec!["7"]);
        let skip = outcome
            .skipped
            .iter()
            .find(|s| s.category.as_deref() == Some(PENDING_CREDIT.to_string().as_str()))
            .unwrap();
        assert!(skip.reason.contains("pending_credit_note"));
        // back on the summary after the failed read
        assert!(page
            .log()
            .iter()
            .any(|l| l == &format!("click {}", selectors::BACK_BUTTON)));
    }
}
