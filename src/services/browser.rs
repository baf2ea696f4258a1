use std::{future::Future, time::Duration};

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::domain::selector::Locator;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    WebDriver(#[from] WebDriverError),
    #[error("browser session unavailable: {0}")]
    Unavailable(String),
}

/// One element of the rendered document.
#[async_trait]
pub trait PageElement: Send + Sync + Sized {
    async fn text(&self) -> Result<String, SessionError>;
    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError>;
    async fn prop(&self, name: &str) -> Result<Option<String>, SessionError>;
    async fn is_displayed(&self) -> Result<bool, SessionError>;
    async fn is_enabled(&self) -> Result<bool, SessionError>;
    async fn find_first(&self, locator: &Locator) -> Result<Option<Self>, SessionError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, SessionError>;
    async fn click(&self) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
    async fn type_text(&self, text: &str) -> Result<(), SessionError>;
}

/// The browser the scraper drives. All calls are sequential from the caller's
/// point of view.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: PageElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError>;
    async fn current_location(&self) -> Result<String, SessionError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, SessionError>;
    async fn find_first(&self, locator: &Locator)
        -> Result<Option<Self::Element>, SessionError>;
}

/// Polls `condition` until it holds or `bound` elapses. Returns whether it held.
pub async fn wait_until<F, Fut>(bound: Duration, poll: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + bound;
    loop {
        if condition().await {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// Waits for the session location to differ from `previous`.
pub async fn wait_for_location_change<S: BrowserSession>(
    session: &S,
    previous: &str,
    bound: Duration,
    poll: Duration,
) -> bool {
    wait_until(bound, poll, move || async move {
        matches!(session.current_location().await, Ok(location) if location != previous)
    })
    .await
}

/// First locator that yields an element, in order. Locator errors count as misses.
pub async fn first_present<S: BrowserSession>(
    session: &S,
    locators: &[Locator],
) -> Option<S::Element> {
    for locator in locators {
        match session.find_first(locator).await {
            Ok(Some(element)) => return Some(element),
            Ok(None) => {}
            Err(e) => log::debug!("Locator {} failed: {:?}", locator, e),
        }
    }
    None
}

/// True when the element is visible, enabled and not marked disabled.
pub async fn is_actionable<E: PageElement>(element: &E) -> bool {
    let displayed = element.is_displayed().await.unwrap_or(false);
    let enabled = element.is_enabled().await.unwrap_or(false);
    let disabled_attr = matches!(element.attr("disabled").await, Ok(Some(_)));

    displayed && enabled && !disabled_attr
}
