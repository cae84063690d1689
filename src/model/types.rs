use crate::error::ConfigError;
use std::fmt;

/// Length of the reporting window requested from the portal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    /// Code used in the report URL's `period` parameter.
    pub fn portal_code(&self) -> &'static str {
        match self {
            Period::Day => "D",
            Period::Month => "M",
            Period::Year => "Y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Period::Day => write!(f, "day"),
            Period::Month => write!(f, "month"),
            Period::Year => write!(f, "year"),
        }
    }
}

/// Time resolution of the returned samples.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    /// Code used in the report URL's `granularity` parameter.
    pub fn portal_code(&self) -> &'static str {
        match self {
            Granularity::Daily => "D",
            Granularity::Hourly => "H",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Hourly => write!(f, "hourly"),
        }
    }
}

/// What the caller asked for. Built once per run and never mutated.
///
/// `month` and `day` are optional because they are only meaningful for some
/// periods; the planner decides whether a missing value is an error.
/// `granularity: None` means "use the default for the period".
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QuerySpec {
    pub period: Period,
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub granularity: Option<Granularity>,
}

impl QuerySpec {
    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            period: Period::Day,
            year,
            month: Some(month),
            day: Some(day),
            granularity: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            period: Period::Month,
            year,
            month: Some(month),
            day: None,
            granularity: None,
        }
    }

    pub fn year(year: i32) -> Self {
        Self {
            period: Period::Year,
            year,
            month: None,
            day: None,
            granularity: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }
}

/// Login and asset identifiers. All values are opaque, non-empty strings.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub object_id: String,
    pub meter_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        object_id: impl Into<String>,
        meter_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let credentials = Self {
            username: username.into(),
            password: password.into(),
            object_id: object_id.into(),
            meter_id: meter_id.into(),
        };
        for (field, value) in [
            ("EST_USERNAME", &credentials.username),
            ("EST_PASSWORD", &credentials.password),
            ("EST_OBJECT_ID", &credentials.object_id),
            ("EST_METER_ID", &credentials.meter_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::missing(field));
            }
        }
        Ok(credentials)
    }
}

// Password stays out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("object_id", &self.object_id)
            .field("meter_id", &self.meter_id)
            .finish()
    }
}
