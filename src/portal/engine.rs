//! One export run: plan, log in, extract, close, normalize.

use crate::config::{BrowserConfig, PortalConfig};
use crate::error::{ConfigError, Error, Result};
use crate::model::{BrowserLauncher, QuerySpec, RecordSet};
use crate::portal::extractor::DataExtractor;
use crate::portal::normalizer::RecordNormalizer;
use crate::portal::query_planner::QueryPlanner;
use crate::portal::session::{SessionController, SessionSettings};
use std::future::Future;

pub struct Engine<L: BrowserLauncher> {
    session: SessionController<L>,
    planner: QueryPlanner,
    extractor: DataExtractor,
    normalizer: RecordNormalizer,
}

impl<L: BrowserLauncher> Engine<L> {
    pub fn new(
        session: SessionController<L>,
        planner: QueryPlanner,
        extractor: DataExtractor,
        normalizer: RecordNormalizer,
    ) -> Self {
        Self {
            session,
            planner,
            extractor,
            normalizer,
        }
    }

    /// Wires an engine from the loaded configuration.
    pub fn from_config(
        launcher: L,
        portal: &PortalConfig,
        browser: &BrowserConfig,
        headless: bool,
    ) -> Result<Self> {
        let credentials = portal.credentials()?;
        let settings = SessionSettings::from_config(portal, browser, headless)?;
        let extractor = DataExtractor::new(
            &portal.base_url,
            credentials.object_id.clone(),
            credentials.meter_id.clone(),
            browser.render_timeout(),
            browser.poll_interval(),
        )?;
        let normalizer = RecordNormalizer::with_offset_minutes(portal.timestamp_offset_minutes)
            .ok_or_else(|| {
                ConfigError::invalid("EST_TIMESTAMP_OFFSET_MINUTES", "must be less than a day")
            })?;
        Ok(Self::new(
            SessionController::new(launcher, credentials, settings),
            QueryPlanner::from_config(portal),
            extractor,
            normalizer,
        ))
    }

    /// Runs `spec` to completion or until `shutdown` resolves.
    ///
    /// The query is planned before any browser is started. Whatever happens
    /// after that, the browser is closed before this returns. `shutdown`
    /// yields the name of the signal that interrupted the run.
    pub async fn run<S>(mut self, spec: &QuerySpec, shutdown: S) -> Result<RecordSet>
    where
        S: Future<Output = &'static str>,
    {
        let plan = self.planner.plan(spec)?;

        let outcome = {
            let work = async {
                let driver = self.session.acquire().await?;
                self.extractor.extract(driver, &plan).await
            };
            tokio::select! {
                result = work => result,
                signal = shutdown => {
                    tracing::warn!(signal, "Interrupted, closing browser");
                    Err(Error::Interrupted(signal))
                }
            }
        };
        self.session.close().await;

        let raw = outcome?;
        self.normalizer.normalize(raw)
    }
}
