//! Error types for the e-st meter exporter.
//!
//! Each stage of a run (configuration, browser launch, login, query planning,
//! extraction, normalization, output) has its own typed error so the binary can
//! report a distinguishing message and exit code without re-running in debug mode.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The browser or WebDriver endpoint could not be started
    #[error("browser launch failed: {0}")]
    Launch(#[from] LaunchError),

    /// Login was rejected or could not be confirmed
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    /// The requested period/date combination is not valid
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// Report page extraction errors
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// A raw series label could not be turned into a timestamp
    #[error("malformed timestamp '{label}' in {series} series")]
    MalformedTimestamp { series: &'static str, label: String },

    /// A WebDriver command failed after the browser was running
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Output could not be written
    #[error("failed to write output to {path}: {source}")]
    Sink {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled by a signal
    #[error("interrupted by {0}")]
    Interrupted(&'static str),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Required configuration value is missing
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Browser start-up errors. Never retried.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The WebDriver endpoint refused the session or is not reachable
    #[error("could not start a browser session via {url}: {message}")]
    Driver { url: String, message: String },
}

/// Login outcomes that end the run.
///
/// `InvalidCredentials` and the challenge variants need different remediation
/// from the user, so they are never folded together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("the portal rejected the username or password")]
    InvalidCredentials,

    #[error("the portal asked for a second authentication factor, which is not supported")]
    UnsupportedSecondFactor,

    #[error("the portal presented a bot-protection challenge ({indicator})")]
    BlockedByProtection { indicator: String },

    #[error("login was not confirmed after {attempts} attempt(s) of {waited:?}")]
    Timeout { attempts: u32, waited: Duration },

    #[error("the portal redirected {url} back to the login page")]
    SessionExpired { url: String },
}

/// Query validation errors; the message names the violated rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("day {day} is outside 1..={max} for {year}-{month:02}")]
    DayOutOfRange { day: u32, max: u32, year: i32, month: u32 },

    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u32),

    #[error("year {year} is outside the supported history {earliest}..={latest}")]
    YearOutOfRange { year: i32, earliest: i32, latest: i32 },

    #[error("{field} is required for a {period} query")]
    MissingField { field: &'static str, period: &'static str },
}

/// Report page errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The object/meter pair does not belong to the account
    #[error("object '{object_id}' / meter '{meter_id}' is not available for this account: {reason}")]
    UnknownAsset {
        object_id: String,
        meter_id: String,
        reason: String,
    },

    /// The chart never finished rendering
    #[error("chart at {url} was not ready after {waited:?}")]
    Timeout { url: String, waited: Duration },

    /// The chart payload is not the expected JSON
    #[error("malformed chart payload: {0}")]
    MalformedPayload(String),
}

/// WebDriver command failures.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("{action} failed: {message}")]
    Command { action: String, message: String },

    #[error("the browser session is already closed")]
    Closed,

    #[error("cannot {action} a session that is {state}")]
    InvalidState { action: &'static str, state: String },
}

impl Error {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::InvalidQuery(_) => 64,
            Error::Extraction(ExtractionError::UnknownAsset { .. }) => 65,
            Error::Launch(_) => 69,
            Error::Browser(_) => 70,
            Error::Sink { .. } => 73,
            Error::Extraction(ExtractionError::Timeout { .. }) => 75,
            Error::Extraction(ExtractionError::MalformedPayload(_))
            | Error::MalformedTimestamp { .. } => 76,
            Error::Authentication(_) => 77,
            Error::Interrupted(_) => 130,
        }
    }

    /// Stage of the run the error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Launch(_) => "launch",
            Error::Authentication(_) => "login",
            Error::InvalidQuery(_) => "plan",
            Error::Extraction(_) | Error::Browser(_) => "extract",
            Error::MalformedTimestamp { .. } => "normalize",
            Error::Sink { .. } => "output",
            Error::Interrupted(_) => "signal",
        }
    }

    /// Only a login timeout is worth one immediate retry by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Authentication(AuthenticationError::Timeout { .. })
                | Error::Extraction(ExtractionError::Timeout { .. })
        )
    }

    pub fn malformed_timestamp(series: &'static str, label: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            series,
            label: label.into(),
        }
    }

    pub fn sink(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new missing configuration error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl LaunchError {
    pub fn driver(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Driver {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

impl ExtractionError {
    pub fn unknown_asset(
        object_id: impl Into<String>,
        meter_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnknownAsset {
            object_id: object_id.into(),
            meter_id: meter_id.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(url: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            waited,
        }
    }

    pub fn malformed_payload(err: impl std::fmt::Display) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl BrowserError {
    /// Creates a command error from any WebDriver error.
    pub fn command(action: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Command {
            action: action.into(),
            message: err.to_string(),
        }
    }
}
