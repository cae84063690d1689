//! Browser session lifecycle and portal login.
//!
//! `SessionController` owns the only browser of a run. It launches it lazily,
//! logs in, hands a borrowed driver to the extractor and guarantees that the
//! browser is closed exactly once, whichever way the run ends.

use crate::config::{BrowserConfig, PortalConfig};
use crate::error::{AuthenticationError, BrowserError, ConfigError, Error, Result};
use crate::model::{BrowserLauncher, Credentials, LaunchOptions, Locator, PortalDriver};
use crate::portal::helper::first_match;
use crate::portal::html_parsing::{
    classify_login_page, LoginPage, COOKIE_ACCEPT_SELECTORS, COOKIE_ACCEPT_XPATHS, LOGIN_INPUT,
    PASSWORD_INPUT, SUBMIT_BUTTON,
};
use crate::portal::wait::poll_until;
use scraper::Html;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Path of the portal login page.
pub const LOGIN_PATH: &str = "/lv/private/user-authentification/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Opened,
    Authenticated,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionState::Unopened => write!(f, "unopened"),
            SessionState::Opened => write!(f, "opened"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Timings and launch options for one session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub login_url: String,
    pub login_timeout: Duration,
    pub login_attempts: u32,
    pub login_backoff: Duration,
    pub poll_interval: Duration,
    pub launch: LaunchOptions,
}

impl SessionSettings {
    pub fn from_config(
        portal: &PortalConfig,
        browser: &BrowserConfig,
        headless: bool,
    ) -> Result<Self, ConfigError> {
        let login_url = Url::parse(&portal.base_url)
            .and_then(|base| base.join(LOGIN_PATH))
            .map_err(|err| ConfigError::invalid("EST_BASE_URL", err.to_string()))?;
        if browser.login_attempts == 0 {
            return Err(ConfigError::invalid("BROWSER_LOGIN_ATTEMPTS", "must be at least 1"));
        }
        Ok(Self {
            login_url: login_url.to_string(),
            login_timeout: browser.login_timeout(),
            login_attempts: browser.login_attempts,
            login_backoff: browser.login_backoff(),
            poll_interval: browser.poll_interval(),
            launch: LaunchOptions {
                headless,
                user_agent: browser.user_agent.clone(),
            },
        })
    }
}

/// Login page as first seen, before anything was submitted.
enum Landing {
    Form,
    AlreadyLoggedIn,
}

fn cookie_accept_button(html: &str) -> Option<&'static str> {
    first_match(&Html::parse_document(html), COOKIE_ACCEPT_SELECTORS)
}

pub struct SessionController<L: BrowserLauncher> {
    launcher: L,
    credentials: Credentials,
    settings: SessionSettings,
    driver: Option<Box<dyn PortalDriver>>,
    state: SessionState,
}

impl<L: BrowserLauncher> SessionController<L> {
    pub fn new(launcher: L, credentials: Credentials, settings: SessionSettings) -> Self {
        Self {
            launcher,
            credentials,
            settings,
            driver: None,
            state: SessionState::Unopened,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn invalid_state(&self, action: &'static str) -> Error {
        BrowserError::InvalidState {
            action,
            state: self.state.to_string(),
        }
        .into()
    }

    /// Launches the stealth-configured browser.
    pub async fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Unopened {
            return Err(self.invalid_state("open"));
        }
        match self.launcher.launch(&self.settings.launch).await {
            Ok(driver) => {
                self.driver = Some(driver);
                self.state = SessionState::Opened;
                Ok(())
            }
            Err(err) => {
                // nothing was started, so there is nothing to release
                self.state = SessionState::Closed;
                Err(err.into())
            }
        }
    }

    /// Logs in on the opened browser.
    ///
    /// Any failure closes the browser before the error is returned.
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.state != SessionState::Opened {
            return Err(self.invalid_state("authenticate"));
        }
        match self.login().await {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                tracing::info!("Logged in to the portal");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Login failed: {}", err);
                self.close().await;
                Err(err)
            }
        }
    }

    /// Authenticated driver, opening and logging in on first use.
    pub async fn acquire(&mut self) -> Result<&dyn PortalDriver> {
        match self.state {
            SessionState::Unopened => {
                self.open().await?;
                self.authenticate().await?;
            }
            SessionState::Opened => self.authenticate().await?,
            SessionState::Authenticated => {}
            SessionState::Closed => return Err(self.invalid_state("acquire")),
        }
        self.driver
            .as_deref()
            .ok_or_else(|| BrowserError::Closed.into())
    }

    /// Releases the browser. Safe to call any number of times.
    pub async fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            match driver.close().await {
                Ok(()) => tracing::info!("Browser session closed"),
                Err(err) => tracing::warn!("Failed to close browser session: {}", err),
            }
        }
        self.state = SessionState::Closed;
    }

    async fn login(&self) -> Result<()> {
        let driver = self.driver.as_deref().ok_or(BrowserError::Closed)?;
        tracing::info!(url = %self.settings.login_url, "Opening login page");
        driver.goto(&self.settings.login_url).await?;

        self.dismiss_cookie_banner(driver).await?;

        let landing = poll_until(self.settings.login_timeout, self.settings.poll_interval, || {
            self.landing_probe(driver)
        })
        .await?;
        match landing {
            Some(Landing::Form) => {}
            Some(Landing::AlreadyLoggedIn) => {
                tracing::info!("Portal session already active");
                return Ok(());
            }
            None => {
                tracing::error!("Login form did not appear");
                return Err(AuthenticationError::Timeout {
                    attempts: 1,
                    waited: self.settings.login_timeout,
                }
                .into());
            }
        }

        tracing::debug!("Submitting login form");
        let filled = driver
            .fill(Locator::Css(LOGIN_INPUT), &self.credentials.username)
            .await?
            && driver
                .fill(Locator::Css(PASSWORD_INPUT), &self.credentials.password)
                .await?;
        if !filled {
            return Err(BrowserError::command("fill login form", "login form disappeared").into());
        }
        if !driver.click(Locator::Css(SUBMIT_BUTTON)).await? {
            return Err(BrowserError::command("submit login form", "submit button not found").into());
        }

        for attempt in 1..=self.settings.login_attempts {
            let confirmed = poll_until(self.settings.login_timeout, self.settings.poll_interval, || {
                self.confirmation_probe(driver)
            })
            .await?;
            if confirmed.is_some() {
                return Ok(());
            }
            tracing::warn!(
                attempt,
                attempts = self.settings.login_attempts,
                "Login not confirmed yet"
            );
            if attempt < self.settings.login_attempts {
                sleep(self.settings.login_backoff * attempt).await;
            }
        }

        Err(AuthenticationError::Timeout {
            attempts: self.settings.login_attempts,
            waited: self.settings.login_timeout * self.settings.login_attempts,
        }
        .into())
    }

    async fn dismiss_cookie_banner(&self, driver: &dyn PortalDriver) -> Result<()> {
        let html = driver.page_source().await?;
        if let Some(selector) = cookie_accept_button(&html) {
            if driver.click(Locator::Css(selector)).await? {
                tracing::debug!(selector, "Accepted cookie banner");
                return Ok(());
            }
        }
        for path in COOKIE_ACCEPT_XPATHS {
            if driver.click(Locator::XPath(path)).await? {
                tracing::debug!(xpath = path, "Accepted cookie banner");
                return Ok(());
            }
        }
        Ok(())
    }

    async fn landing_probe(&self, driver: &dyn PortalDriver) -> Result<Option<Landing>> {
        let url = driver.current_url().await?;
        let html = driver.page_source().await?;
        match classify_login_page(&url, &html) {
            LoginPage::Form | LoginPage::InvalidCredentials => Ok(Some(Landing::Form)),
            LoginPage::LoggedIn => Ok(Some(Landing::AlreadyLoggedIn)),
            LoginPage::Challenge(indicator) => {
                Err(AuthenticationError::BlockedByProtection { indicator }.into())
            }
            LoginPage::SecondFactor => Err(AuthenticationError::UnsupportedSecondFactor.into()),
            LoginPage::Pending => Ok(None),
        }
    }

    async fn confirmation_probe(&self, driver: &dyn PortalDriver) -> Result<Option<()>> {
        let url = driver.current_url().await?;
        let html = driver.page_source().await?;
        match classify_login_page(&url, &html) {
            LoginPage::LoggedIn => Ok(Some(())),
            LoginPage::InvalidCredentials => Err(AuthenticationError::InvalidCredentials.into()),
            LoginPage::Challenge(indicator) => {
                Err(AuthenticationError::BlockedByProtection { indicator }.into())
            }
            LoginPage::SecondFactor => Err(AuthenticationError::UnsupportedSecondFactor.into()),
            LoginPage::Form | LoginPage::Pending => Ok(None),
        }
    }
}

impl<L: BrowserLauncher> Drop for SessionController<L> {
    fn drop(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Session dropped while open, closing browser in background");
                handle.spawn(async move {
                    if let Err(err) = driver.close().await {
                        tracing::warn!("Failed to close browser session: {}", err);
                    }
                });
            }
            Err(_) => tracing::error!("Session dropped outside a runtime, browser left running"),
        }
    }
}
