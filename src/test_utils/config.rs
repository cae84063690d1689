//! Configuration utilities for testing.
//!
//! Builders for portal and browser configurations with fast timeouts, so tests
//! that drive the polling loops finish in milliseconds.

use crate::config::{BrowserConfig, PortalConfig};
use crate::model::Credentials;
use crate::test_utils::fixtures::constants::{BASE_URL, METER_ID, OBJECT_ID, PASSWORD, USERNAME};

/// Builder for creating test portal configurations.
#[derive(Debug)]
pub struct TestPortalConfigBuilder {
    base_url: String,
    object_id: String,
    meter_id: String,
    earliest_year: i32,
    timestamp_offset_minutes: i32,
}

impl TestPortalConfigBuilder {
    /// Creates a new test config builder with default values.
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            object_id: OBJECT_ID.to_string(),
            meter_id: METER_ID.to_string(),
            earliest_year: 2010,
            timestamp_offset_minutes: 0,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timestamp_offset_minutes(mut self, minutes: i32) -> Self {
        self.timestamp_offset_minutes = minutes;
        self
    }

    pub fn build(self) -> PortalConfig {
        PortalConfig {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            object_id: self.object_id,
            meter_id: self.meter_id,
            base_url: self.base_url,
            earliest_year: self.earliest_year,
            timestamp_offset_minutes: self.timestamp_offset_minutes,
        }
    }
}

/// Builder for creating test browser configurations.
#[derive(Debug)]
pub struct TestBrowserConfigBuilder {
    login_timeout_ms: u64,
    login_attempts: u32,
    render_timeout_ms: u64,
}

impl TestBrowserConfigBuilder {
    /// Creates a new test config builder with millisecond-scale waits.
    pub fn new() -> Self {
        Self {
            login_timeout_ms: 40,
            login_attempts: 3,
            render_timeout_ms: 40,
        }
    }

    pub fn with_login_attempts(mut self, attempts: u32) -> Self {
        self.login_attempts = attempts;
        self
    }

    pub fn with_render_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.render_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> BrowserConfig {
        BrowserConfig {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            user_agent: "test-agent".to_string(),
            login_timeout_ms: self.login_timeout_ms,
            login_attempts: self.login_attempts,
            login_backoff_ms: 1,
            render_timeout_ms: self.render_timeout_ms,
            poll_interval_ms: 1,
        }
    }
}

/// Credentials matching the fixture constants.
pub fn test_credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD, OBJECT_ID, METER_ID).unwrap()
}
