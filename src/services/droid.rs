use async_trait::async_trait;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WebElement};

use crate::{configuration::BrowserSettings, domain::selector::Locator};

use super::{BrowserSession, PageElement, SessionError};

pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn new(settings: &BrowserSettings) -> Result<Self, SessionError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        caps.set_no_sandbox()?;
        caps.set_disable_dev_shm_usage()?;

        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                SessionError::Unavailable(format!(
                    "could not reach webdriver at {}: {}",
                    settings.webdriver_url, e
                ))
            })?;

        if settings.maximize_window {
            driver.maximize_window().await?;
        }

        Ok(Droid { driver })
    }

    pub async fn quit(self) -> Result<(), SessionError> {
        self.driver.quit().await?;
        Ok(())
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::XPath(expr) => By::XPath(expr.as_str()),
        Locator::Css(expr) => By::Css(expr.as_str()),
        Locator::ClassName(name) => By::ClassName(name.as_str()),
    }
}

#[async_trait]
impl BrowserSession for Droid {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_location(&self) -> Result<String, SessionError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>, SessionError> {
        Ok(self.driver.find_all(to_by(locator)).await?)
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<WebElement>, SessionError> {
        Ok(self.driver.find_all(to_by(locator)).await?.into_iter().next())
    }
}

#[async_trait]
impl PageElement for WebElement {
    async fn text(&self) -> Result<String, SessionError> {
        Ok(WebElement::text(self).await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError> {
        Ok(WebElement::attr(self, name).await?)
    }

    async fn prop(&self, name: &str) -> Result<Option<String>, SessionError> {
        Ok(WebElement::prop(self, name).await?)
    }

    async fn is_displayed(&self) -> Result<bool, SessionError> {
        Ok(WebElement::is_displayed(self).await?)
    }

    async fn is_enabled(&self) -> Result<bool, SessionError> {
        Ok(WebElement::is_enabled(self).await?)
    }

    async fn find_first(&self, locator: &Locator) -> Result<Option<Self>, SessionError> {
        Ok(WebElement::find_all(self, to_by(locator))
            .await?
            .into_iter()
            .next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, SessionError> {
        Ok(WebElement::find_all(self, to_by(locator)).await?)
    }

    async fn click(&self) -> Result<(), SessionError> {
        WebElement::click(self).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        WebElement::clear(self).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), SessionError> {
        WebElement::send_keys(self, text).await?;
        Ok(())
    }
}
