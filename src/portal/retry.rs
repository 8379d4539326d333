use crate::browser::{Locator, PortalPage};
use crate::error::{UiError, UiResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    Any,
    Intercepted,
}

/// Bounded retry with a recovery step run between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub retry_on: RetryOn,
}

impl RetryPolicy {
    /// Login click: a few attempts on any failure.
    pub fn login(backoff: Duration) -> Self {
        Self {
            attempts: 3,
            backoff,
            retry_on: RetryOn::Any,
        }
    }

    /// Click that a modal overlay may swallow: one more attempt after recovery.
    pub fn intercepted_once() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(500),
            retry_on: RetryOn::Intercepted,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn should_retry(&self, err: &UiError) -> bool {
        match self.retry_on {
            RetryOn::Any => true,
            RetryOn::Intercepted => err.is_intercepted(),
        }
    }

    /// Run `op` until it succeeds or attempts run out. `recover` runs after each retryable
    /// failure; a failing recovery is logged and the next attempt still happens.
    pub async fn run<T, Op, OpFut, Rec, RecFut>(&self, what: &str, mut op: Op, mut recover: Rec) -> UiResult<T>
    where
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = UiResult<T>>,
        Rec: FnMut(&UiError) -> RecFut,
        RecFut: Future<Output = UiResult<()>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && self.should_retry(&e) => {
                    tracing::warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    if let Err(re) = recover(&e).await {
                        tracing::warn!("{}: recovery step failed: {}", what, re);
                    }
                    sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn run_plain<T, Op, OpFut>(&self, what: &str, op: Op) -> UiResult<T>
    where
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = UiResult<T>>,
    {
        self.run(what, op, |_| async { Ok(()) }).await
    }
}

/// Normal click, falling back to a JavaScript click when an overlay intercepts it.
pub async fn click_or_force<P: PortalPage + ?Sized>(page: &P, target: &Locator) -> UiResult<()> {
    match page.click(target).await {
        Err(e) if e.is_intercepted() => {
            tracing::debug!("{}, forcing click", e);
            page.force_click(target).await
        }
        other => other,
    }
}
