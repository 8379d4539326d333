use super::retry::RetryPolicy;
use super::selectors;
use crate::browser::{Locator, PortalPage};
use crate::config::{LoginMethod, PortalTimeouts};
use crate::error::{ScrapeError, UiError, UiResult};

/// Open the login page and authenticate. Any failure here is fatal for the login.
pub async fn login<P: PortalPage + ?Sized>(
    page: &P,
    method: &LoginMethod,
    timeouts: &PortalTimeouts,
) -> Result<(), ScrapeError> {
    page.goto(selectors::LOGIN_URL)
        .await
        .map_err(|source| ScrapeError::Navigation {
            step: "login page",
            source,
        })?;

    let policy = RetryPolicy::login(timeouts.login_backoff);
    let wait = timeouts.element;

    let result = match method {
        LoginMethod::Password { rut, password } => {
            tracing::info!("Logging in as {}", rut);
            policy
                .run_plain("login", || async move {
                    page.wait_for(&selectors::RUT_INPUT, wait).await?;
                    page.type_text(&selectors::RUT_INPUT, rut).await?;
                    page.type_text(&selectors::PASSWORD_INPUT, password).await?;
                    page.click(&selectors::LOGIN_BUTTON).await
                })
                .await
        }
        LoginMethod::Certificate => {
            tracing::info!("Logging in with certificate");
            policy
                .run_plain("certificate login", || async move {
                    page.wait_for(&selectors::CERTIFICATE_LINK, wait).await?;
                    page.click(&selectors::CERTIFICATE_LINK).await?;
                    page.accept_alert(wait).await
                })
                .await
        }
    };

    result.map_err(|source| ScrapeError::Login {
        attempts: policy.attempts,
        source,
    })
}

#[derive(Clone, Copy)]
enum ClickKind {
    Plain,
    Hover,
}

async fn step<P: PortalPage + ?Sized>(
    page: &P,
    name: &'static str,
    target: &Locator,
    kind: ClickKind,
    timeouts: &PortalTimeouts,
) -> Result<(), ScrapeError> {
    let run = async {
        page.wait_for(target, timeouts.element).await?;
        match kind {
            ClickKind::Plain => page.click(target).await,
            ClickKind::Hover => page.hover_click(target).await,
        }
    };
    run.await.map_err(|source: UiError| ScrapeError::Navigation { step: name, source })?;
    tracing::debug!("Navigation step '{}' done", name);
    Ok(())
}

/// Walk the menus to the purchase registry and return the selectable RUTs
/// (placeholder entry and blank values dropped).
pub async fn open_registry<P: PortalPage + ?Sized>(
    page: &P,
    timeouts: &PortalTimeouts,
) -> Result<Vec<String>, ScrapeError> {
    step(page, "services menu", &selectors::SERVICES_MENU, ClickKind::Hover, timeouts).await?;
    step(page, "invoice menu", &selectors::INVOICE_MENU, ClickKind::Plain, timeouts).await?;
    step(page, "registry accordion", &selectors::REGISTRY_ACCORDION, ClickKind::Plain, timeouts).await?;
    step(page, "registry entry", &selectors::REGISTRY_ENTRY, ClickKind::Plain, timeouts).await?;

    let options: UiResult<Vec<String>> = async {
        page.wait_for_count(&selectors::RUT_OPTIONS, 2, timeouts.element).await?;
        page.option_values(&selectors::RUT_SELECT).await
    }
    .await;
    let options = options.map_err(|source| ScrapeError::Navigation {
        step: "rut selector",
        source,
    })?;

    let ruts: Vec<String> = options
        .into_iter()
        .skip(1)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    tracing::info!("Registry ready, {} RUTs to query", ruts.len());
    Ok(ruts)
}
