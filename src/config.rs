use crate::error::ConfigError;
use crate::model::Credentials;
use anyhow::{anyhow, Result};
use serde_derive::Deserialize;
use std::str::FromStr;
use std::time::Duration;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig> {
    match envy::from_env::<AppConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load AppConfig: {}", err)),
    }
}

fn default_base_url() -> String {
    "https://mans.e-st.lv".to_string()
}

fn default_earliest_year() -> i32 {
    2010
}

#[derive(Deserialize, Debug, Clone)]
pub struct PortalConfig {
    pub username: String,
    pub password: String,
    pub object_id: String,
    pub meter_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    // oldest year the portal keeps readings for
    #[serde(default = "default_earliest_year")]
    pub earliest_year: i32,
    // offset applied when a chart label is an epoch timestamp
    #[serde(default)]
    pub timestamp_offset_minutes: i32,
}

impl PortalConfig {
    /// Splits out the credential set, rejecting empty values.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::new(
            self.username.clone(),
            self.password.clone(),
            self.object_id.clone(),
            self.meter_id.clone(),
        )
    }
}

pub(crate) fn load_portal_config() -> Result<PortalConfig> {
    match envy::prefixed("EST_").from_env::<PortalConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load PortalConfig: {}", err)),
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_login_timeout_ms() -> u64 {
    20_000
}

fn default_login_attempts() -> u32 {
    3
}

fn default_login_backoff_ms() -> u64 {
    1000
}

fn default_render_timeout_ms() -> u64 {
    20_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,
    #[serde(default = "default_login_backoff_ms")]
    pub login_backoff_ms: u64,
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl BrowserConfig {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn login_backoff(&self) -> Duration {
        Duration::from_millis(self.login_backoff_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn load_browser_config() -> Result<BrowserConfig> {
    match envy::prefixed("BROWSER_").from_env::<BrowserConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load BrowserConfig: {}", err)),
    }
}
