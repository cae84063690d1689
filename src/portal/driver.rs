//! WebDriver-backed browser port.
//!
//! Talks to a chromedriver endpoint through `fantoccini`. Page inspection is
//! left to the callers, which parse `page_source()` themselves.

use crate::error::{BrowserError, LaunchError};
use crate::model::{BrowserLauncher, LaunchOptions, Locator, PortalDriver};
use crate::portal::stealth::{chrome_capabilities, STEALTH_SCRIPT};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};

/// Starts Chrome sessions on a chromedriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PortalDriver>, LaunchError> {
        tracing::debug!(
            webdriver_url = %self.webdriver_url,
            headless = options.headless,
            "Requesting browser session"
        );
        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities(options));
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|err| LaunchError::driver(self.webdriver_url.as_str(), err))?;

        let portal = WebDriverPortal {
            client: Some(client),
        };
        if let Err(err) = portal.hide_automation().await {
            tracing::warn!("Failed to patch navigator properties: {}", err);
        }
        tracing::info!(headless = options.headless, "Browser session started");
        Ok(Box::new(portal))
    }
}

/// One Chrome tab driven over WebDriver.
pub struct WebDriverPortal {
    client: Option<Client>,
}

impl WebDriverPortal {
    fn client(&self) -> Result<&Client, BrowserError> {
        self.client.as_ref().ok_or(BrowserError::Closed)
    }

    async fn hide_automation(&self) -> Result<(), BrowserError> {
        self.client()?
            .execute(STEALTH_SCRIPT, Vec::new())
            .await
            .map_err(|err| BrowserError::command("stealth script", err))?;
        Ok(())
    }

    async fn find(&self, locator: Locator<'_>) -> Result<Option<Element>, BrowserError> {
        let target = match locator {
            Locator::Css(selector) => fantoccini::Locator::Css(selector),
            Locator::XPath(path) => fantoccini::Locator::XPath(path),
        };
        match self.client()?.find(target).await {
            Ok(element) => Ok(Some(element)),
            Err(err) if err.is_no_such_element() => Ok(None),
            Err(err) => Err(BrowserError::command(format!("find {}", locator.as_str()), err)),
        }
    }

    async fn script_click(&self, element: &Element) -> Result<(), BrowserError> {
        let argument = serde_json::to_value(element)
            .map_err(|err| BrowserError::command("script click", err))?;
        self.client()?
            .execute("arguments[0].click();", vec![argument])
            .await
            .map_err(|err| BrowserError::command("script click", err))?;
        Ok(())
    }
}

fn is_click_refused(err: &CmdError) -> bool {
    matches!(
        err,
        CmdError::Standard(e)
            if matches!(
                e.error,
                fantoccini::error::ErrorStatus::ElementNotInteractable
                    | fantoccini::error::ErrorStatus::ElementClickIntercepted
            )
    )
}

#[async_trait]
impl PortalDriver for WebDriverPortal {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.client()?
            .goto(url)
            .await
            .map_err(|err| BrowserError::command(format!("goto {}", url), err))?;
        if let Err(err) = self.hide_automation().await {
            tracing::debug!("Failed to patch navigator properties: {}", err);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let url = self
            .client()?
            .current_url()
            .await
            .map_err(|err| BrowserError::command("current url", err))?;
        Ok(url.to_string())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        self.client()?
            .source()
            .await
            .map_err(|err| BrowserError::command("page source", err))
    }

    async fn fill(&self, locator: Locator<'_>, text: &str) -> Result<bool, BrowserError> {
        let Some(element) = self.find(locator).await? else {
            return Ok(false);
        };
        let action = format!("fill {}", locator.as_str());
        element
            .clear()
            .await
            .map_err(|err| BrowserError::command(action.as_str(), err))?;
        element
            .send_keys(text)
            .await
            .map_err(|err| BrowserError::command(action.as_str(), err))?;
        Ok(true)
    }

    async fn click(&self, locator: Locator<'_>) -> Result<bool, BrowserError> {
        let Some(element) = self.find(locator).await? else {
            return Ok(false);
        };
        match element.clone().click().await {
            Ok(_) => Ok(true),
            Err(err) if is_click_refused(&err) => {
                tracing::debug!(locator = locator.as_str(), "Native click refused, using script click");
                self.script_click(&element).await?;
                Ok(true)
            }
            Err(err) => Err(BrowserError::command(format!("click {}", locator.as_str()), err)),
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let client = self.client.take().ok_or(BrowserError::Closed)?;
        client
            .close()
            .await
            .map_err(|err| BrowserError::command("close", err))
    }
}
