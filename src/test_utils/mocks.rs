//! Scripted browser doubles for testing.
//!
//! `FakeLauncher` hands out `FakeDriver`s that behave like a tiny recorded
//! portal: navigating to a URL loads the pages registered for it, and each
//! `page_source()` call advances to the next page of that route until the last
//! one is reached, which mimics a page that finishes rendering over time.

use crate::error::{BrowserError, LaunchError};
use crate::model::{BrowserLauncher, LaunchOptions, Locator, PortalDriver};
use crate::portal::helper::has_element;
use crate::portal::html_parsing::SUBMIT_BUTTON;
use async_trait::async_trait;
use scraper::Html;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Route {
    url_fragment: String,
    pages: Vec<String>,
}

/// Pages the fake portal serves.
#[derive(Debug, Clone, Default)]
pub struct PortalScript {
    routes: Vec<Route>,
    after_submit: Option<(String, Vec<String>)>,
}

impl PortalScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `pages` in order for any URL containing `url_fragment`.
    pub fn route(mut self, url_fragment: &str, pages: Vec<String>) -> Self {
        self.routes.push(Route {
            url_fragment: url_fragment.to_string(),
            pages,
        });
        self
    }

    /// Clicking the submit button moves the tab to `url` showing `pages`.
    pub fn after_submit(mut self, url: &str, pages: Vec<String>) -> Self {
        self.after_submit = Some((url.to_string(), pages));
        self
    }
}

/// Shared view into what the fake drivers were asked to do.
#[derive(Debug, Clone, Default)]
pub struct DriverProbe {
    closes: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl DriverProbe {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Commands starting with `prefix`, e.g. `"goto "`.
    pub fn commands_starting_with(&self, prefix: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|command| command.starts_with(prefix))
            .collect()
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

#[derive(Debug)]
struct TabState {
    url: String,
    pages: VecDeque<String>,
    closed: bool,
}

pub struct FakeDriver {
    script: PortalScript,
    probe: DriverProbe,
    tab: Mutex<TabState>,
}

impl FakeDriver {
    pub fn new(script: PortalScript, probe: DriverProbe) -> Self {
        Self {
            script,
            probe,
            tab: Mutex::new(TabState {
                url: "about:blank".to_string(),
                pages: VecDeque::new(),
                closed: false,
            }),
        }
    }

    fn load(&self, url: &str, pages: Vec<String>) -> Result<(), BrowserError> {
        let mut tab = self.tab.lock().unwrap();
        if tab.closed {
            return Err(BrowserError::Closed);
        }
        tab.url = url.to_string();
        tab.pages = pages.into();
        Ok(())
    }

    fn current_page(&self) -> Result<String, BrowserError> {
        let tab = self.tab.lock().unwrap();
        if tab.closed {
            return Err(BrowserError::Closed);
        }
        Ok(tab.pages.front().cloned().unwrap_or_default())
    }

    fn matches(&self, locator: Locator<'_>) -> Result<bool, BrowserError> {
        Ok(match locator {
            Locator::Css(selector) => has_element(&Html::parse_document(&self.current_page()?), selector),
            Locator::XPath(_) => false,
        })
    }
}

#[async_trait]
impl PortalDriver for FakeDriver {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.probe.record(format!("goto {}", url));
        let pages = self
            .script
            .routes
            .iter()
            .find(|route| url.contains(&route.url_fragment))
            .map(|route| route.pages.clone())
            .unwrap_or_default();
        self.load(url, pages)
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let tab = self.tab.lock().unwrap();
        if tab.closed {
            return Err(BrowserError::Closed);
        }
        Ok(tab.url.clone())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        let mut tab = self.tab.lock().unwrap();
        if tab.closed {
            return Err(BrowserError::Closed);
        }
        let page = if tab.pages.len() > 1 {
            tab.pages.pop_front()
        } else {
            tab.pages.front().cloned()
        };
        Ok(page.unwrap_or_default())
    }

    async fn fill(&self, locator: Locator<'_>, text: &str) -> Result<bool, BrowserError> {
        let found = self.matches(locator)?;
        // only the length of the typed text is recorded
        self.probe
            .record(format!("fill {} ({} chars)", locator.as_str(), text.chars().count()));
        Ok(found)
    }

    async fn click(&self, locator: Locator<'_>) -> Result<bool, BrowserError> {
        let found = self.matches(locator)?;
        self.probe.record(format!("click {}", locator.as_str()));
        if found && locator == Locator::Css(SUBMIT_BUTTON) {
            if let Some((url, pages)) = self.script.after_submit.clone() {
                self.load(&url, pages)?;
            }
        }
        Ok(found)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let mut tab = self.tab.lock().unwrap();
        if tab.closed {
            return Err(BrowserError::Closed);
        }
        tab.closed = true;
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.probe.record("close".to_string());
        Ok(())
    }
}

/// Launcher that hands out `FakeDriver`s, or fails like a missing chromedriver.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    script: PortalScript,
    probe: DriverProbe,
    failure: Option<String>,
    launches: Arc<AtomicUsize>,
    last_options: Arc<Mutex<Option<LaunchOptions>>>,
}

impl FakeLauncher {
    pub fn new(script: PortalScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn probe(&self) -> DriverProbe {
        self.probe.clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<LaunchOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PortalDriver>, LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if let Some(message) = &self.failure {
            return Err(LaunchError::driver("fake://webdriver", message));
        }
        Ok(Box::new(FakeDriver::new(
            self.script.clone(),
            self.probe.clone(),
        )))
    }
}
