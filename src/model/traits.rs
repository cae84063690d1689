use crate::error::{BrowserError, LaunchError};
use async_trait::async_trait;

/// Element lookup understood by every driver.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Locator<'a> {
    Css(&'a str),
    XPath(&'a str),
}

impl Locator<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Locator::Css(selector) | Locator::XPath(selector) => selector,
        }
    }
}

/// Options that shape the launched browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub user_agent: String,
}

/// Narrow view of a live browser tab.
///
/// Everything the session controller and the extractor need from the portal
/// goes through here, which is what lets the engine run against a recorded
/// portal in tests. Implementors must serialize commands themselves; callers
/// never issue two commands concurrently.
#[async_trait]
pub trait PortalDriver: Send + Sync {
    /// Navigates to `url` and waits for the document to load.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Serialized DOM of the current page.
    async fn page_source(&self) -> Result<String, BrowserError>;

    /// Types `text` into the first element matching `locator`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    async fn fill(&self, locator: Locator<'_>, text: &str) -> Result<bool, BrowserError>;

    /// Clicks the first element matching `locator`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    async fn click(&self, locator: Locator<'_>) -> Result<bool, BrowserError>;

    /// Ends the browser session. Further commands fail with `BrowserError::Closed`.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Starts browsers.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PortalDriver>, LaunchError>;
}
