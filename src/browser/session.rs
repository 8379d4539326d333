use super::{Locator, PortalPage};
use crate::error::{ScrapeError, UiError, UiResult};
use async_trait::async_trait;
use serde_json::json;
use std::time::{Duration, Instant};
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use tokio::time::sleep;

/// Chrome launch settings for one portal session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub headless: bool,
    /// Skip images, fonts and stylesheets; the portal is slow enough without them.
    pub lean_rendering: bool,
    pub poll_interval: Duration,
}

impl BrowserOptions {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
            lean_rendering: true,
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// One exclusive WebDriver session. Close it with [`BrowserSession::close`].
pub struct BrowserSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl BrowserSession {
    pub async fn open(options: &BrowserOptions) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        let browser_err = |e: WebDriverError| ScrapeError::Browser(e.to_string());

        if options.headless {
            caps.add_arg("--headless=new").map_err(browser_err)?;
        }
        caps.add_arg("--no-sandbox").map_err(browser_err)?;
        caps.add_arg("--disable-dev-shm-usage").map_err(browser_err)?;
        caps.add_arg("--window-size=1920,1080").map_err(browser_err)?;

        if options.lean_rendering {
            caps.add_experimental_option(
                "prefs",
                json!({
                    "profile.managed_default_content_settings.images": 2,
                    "profile.managed_default_content_settings.fonts": 2,
                    "profile.managed_default_content_settings.stylesheets": 2,
                }),
            )
            .map_err(browser_err)?;
        }

        let driver = WebDriver::new(options.webdriver_url.as_str(), caps)
            .await
            .map_err(browser_err)?;
        tracing::debug!(
            "Browser session opened on {} (headless: {})",
            options.webdriver_url,
            options.headless
        );

        Ok(Self {
            driver,
            poll_interval: options.poll_interval,
        })
    }

    pub async fn close(self) -> Result<(), UiError> {
        self.driver.quit().await?;
        tracing::debug!("Browser session closed");
        Ok(())
    }

    async fn element(&self, target: &Locator) -> UiResult<WebElement> {
        self.driver.find(target.to_by()).await.map_err(|_| UiError::NotFound {
            what: target.to_string(),
        })
    }
}

#[async_trait]
impl PortalPage for BrowserSession {
    async fn goto(&self, url: &str) -> UiResult<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_for(&self, target: &Locator, timeout: Duration) -> UiResult<()> {
        self.driver
            .query(target.to_by())
            .wait(timeout, self.poll_interval)
            .and_clickable()
            .first()
            .await
            .map(|_| ())
            .map_err(|_| UiError::Timeout {
                what: target.to_string(),
                waited: timeout,
            })
    }

    async fn wait_for_count(&self, target: &Locator, min: usize, timeout: Duration) -> UiResult<usize> {
        let started = Instant::now();
        loop {
            let found = self.driver.find_all(target.to_by()).await?.len();
            if found >= min {
                return Ok(found);
            }
            if started.elapsed() >= timeout {
                return Err(UiError::Timeout {
                    what: format!("{} (>= {} elements, saw {})", target, min, found),
                    waited: timeout,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn is_present(&self, target: &Locator) -> UiResult<bool> {
        Ok(!self.driver.find_all(target.to_by()).await?.is_empty())
    }

    async fn click(&self, target: &Locator) -> UiResult<()> {
        let elem = self.element(target).await?;
        elem.click().await.map_err(|e| match UiError::from(e) {
            UiError::Intercepted { .. } => UiError::Intercepted {
                what: target.to_string(),
            },
            other => other,
        })
    }

    async fn force_click(&self, target: &Locator) -> UiResult<()> {
        let elem = self.element(target).await?;
        self.driver
            .execute("arguments[0].click();", vec![elem.to_json()?])
            .await?;
        Ok(())
    }

    async fn hover_click(&self, target: &Locator) -> UiResult<()> {
        let elem = self.element(target).await?;
        self.driver
            .action_chain()
            .move_to_element_center(&elem)
            .click()
            .perform()
            .await?;
        Ok(())
    }

    async fn type_text(&self, target: &Locator, text: &str) -> UiResult<()> {
        let elem = self.element(target).await?;
        elem.clear().await?;
        elem.send_keys(text).await?;
        Ok(())
    }

    async fn accept_alert(&self, timeout: Duration) -> UiResult<()> {
        let started = Instant::now();
        loop {
            if let Ok(text) = self.driver.get_alert_text().await {
                tracing::debug!("Accepting alert: {}", text);
                self.driver.accept_alert().await?;
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(UiError::NoAlert { waited: timeout });
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn option_values(&self, select: &Locator) -> UiResult<Vec<String>> {
        let elem = self.element(select).await?;
        let mut values = Vec::new();
        for option in elem.find_all(By::Tag("option")).await? {
            values.push(option.value().await?.unwrap_or_default());
        }
        Ok(values)
    }

    async fn select_value(&self, select: &Locator, value: &str) -> UiResult<()> {
        let elem = self.element(select).await?;
        SelectElement::new(&elem).await?.select_by_value(value).await?;
        Ok(())
    }

    async fn text_of(&self, target: &Locator) -> UiResult<String> {
        let elem = self.element(target).await?;
        Ok(elem.text().await?.trim().to_string())
    }

    async fn source(&self) -> UiResult<String> {
        Ok(self.driver.source().await?)
    }
}
