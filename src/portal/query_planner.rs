//! Query planning for e-st report requests.
//!
//! Turns a caller's `QuerySpec` into a validated date range, an effective
//! granularity and the query parameters of the consumption chart page.

use crate::config::PortalConfig;
use crate::error::QueryError;
use crate::model::{Granularity, Period, QuerySpec};
use chrono::{Datelike, Local, NaiveDate};

/// Which granularities each period accepts, and what to use otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranularityRules {
    pub day: (Vec<Granularity>, Granularity),
    pub month: (Vec<Granularity>, Granularity),
    pub year: (Vec<Granularity>, Granularity),
}

impl Default for GranularityRules {
    fn default() -> Self {
        Self {
            day: (vec![Granularity::Hourly], Granularity::Hourly),
            month: (
                vec![Granularity::Daily, Granularity::Hourly],
                Granularity::Daily,
            ),
            year: (vec![Granularity::Daily], Granularity::Daily),
        }
    }
}

impl GranularityRules {
    fn for_period(&self, period: Period) -> &(Vec<Granularity>, Granularity) {
        match period {
            Period::Day => &self.day,
            Period::Month => &self.month,
            Period::Year => &self.year,
        }
    }

    /// Resolves the granularity to request.
    ///
    /// # Returns
    /// The effective granularity and whether it differs from an explicit request
    pub fn resolve(&self, period: Period, requested: Option<Granularity>) -> (Granularity, bool) {
        let (compatible, default) = self.for_period(period);
        match requested {
            Some(granularity) if compatible.contains(&granularity) => (granularity, false),
            Some(_) => (*default, true),
            None => (*default, false),
        }
    }
}

/// The portal view a plan points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetView {
    Day { date: NaiveDate },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

/// A validated, portal-addressable query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub effective_granularity: Granularity,
    pub target_view: TargetView,
    pub granularity_substituted: bool,
}

impl PlannedQuery {
    /// Number of calendar days covered, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.range_end - self.range_start).num_days() + 1
    }

    /// Query parameters for the chart page, in the order the portal builds them.
    ///
    /// # Format
    /// ```text
    /// period=D&date=15.09.2025&granularity=H
    /// period=M&year=2025&month=9&granularity=D
    /// period=Y&year=2025
    /// ```
    pub fn portal_params(&self) -> Vec<(&'static str, String)> {
        match self.target_view {
            TargetView::Day { date } => vec![
                ("period", Period::Day.portal_code().to_string()),
                ("date", date.format("%d.%m.%Y").to_string()),
                (
                    "granularity",
                    self.effective_granularity.portal_code().to_string(),
                ),
            ],
            TargetView::Month { year, month } => vec![
                ("period", Period::Month.portal_code().to_string()),
                ("year", year.to_string()),
                ("month", month.to_string()),
                (
                    "granularity",
                    self.effective_granularity.portal_code().to_string(),
                ),
            ],
            // the portal picks the resolution of the year view itself
            TargetView::Year { year } => vec![
                ("period", Period::Year.portal_code().to_string()),
                ("year", year.to_string()),
            ],
        }
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

#[derive(Debug, Clone)]
pub struct QueryPlanner {
    rules: GranularityRules,
    earliest_year: i32,
    latest_year: i32,
}

impl QueryPlanner {
    pub fn new(earliest_year: i32, latest_year: i32) -> Self {
        Self {
            rules: GranularityRules::default(),
            earliest_year,
            latest_year,
        }
    }

    /// Planner accepting years from `EST_EARLIEST_YEAR` up to the current year.
    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.earliest_year, Local::now().year())
    }

    pub fn with_rules(mut self, rules: GranularityRules) -> Self {
        self.rules = rules;
        self
    }

    /// Validates `spec` and derives the range, granularity and view.
    ///
    /// Checks run in a fixed order (required fields, day, month, year) and the
    /// first violation is returned. An incompatible granularity is never an
    /// error; it is replaced by the period default.
    pub fn plan(&self, spec: &QuerySpec) -> Result<PlannedQuery, QueryError> {
        let period_name = match spec.period {
            Period::Day => "day",
            Period::Month => "month",
            Period::Year => "year",
        };
        let month = match spec.period {
            Period::Year => None,
            Period::Day | Period::Month => Some(spec.month.ok_or(QueryError::MissingField {
                field: "month",
                period: period_name,
            })?),
        };
        let day = match spec.period {
            Period::Day => Some(spec.day.ok_or(QueryError::MissingField {
                field: "day",
                period: period_name,
            })?),
            Period::Month | Period::Year => None,
        };

        if let (Some(day), Some(month)) = (day, month) {
            let max = if (1..=12).contains(&month) {
                days_in_month(spec.year, month).unwrap_or(31)
            } else {
                31
            };
            if day < 1 || day > max {
                return Err(QueryError::DayOutOfRange {
                    day,
                    max,
                    year: spec.year,
                    month,
                });
            }
        }
        if let Some(month) = month {
            if !(1..=12).contains(&month) {
                return Err(QueryError::MonthOutOfRange(month));
            }
        }
        if !(1000..=9999).contains(&spec.year)
            || spec.year < self.earliest_year
            || spec.year > self.latest_year
        {
            return Err(QueryError::YearOutOfRange {
                year: spec.year,
                earliest: self.earliest_year,
                latest: self.latest_year,
            });
        }

        let (effective_granularity, substituted) =
            self.rules.resolve(spec.period, spec.granularity);
        if substituted {
            tracing::info!(
                period = %spec.period,
                requested = ?spec.granularity,
                effective = %effective_granularity,
                "Requested granularity is not offered for this period, using the default"
            );
        }

        let out_of_range = || QueryError::YearOutOfRange {
            year: spec.year,
            earliest: self.earliest_year,
            latest: self.latest_year,
        };
        let (range_start, range_end, target_view) = match (month, day) {
            (Some(month), Some(day)) => {
                let date = NaiveDate::from_ymd_opt(spec.year, month, day).ok_or_else(out_of_range)?;
                (date, date, TargetView::Day { date })
            }
            (Some(month), None) => {
                let start = NaiveDate::from_ymd_opt(spec.year, month, 1).ok_or_else(out_of_range)?;
                let last = days_in_month(spec.year, month).ok_or_else(out_of_range)?;
                let end = NaiveDate::from_ymd_opt(spec.year, month, last).ok_or_else(out_of_range)?;
                (
                    start,
                    end,
                    TargetView::Month {
                        year: spec.year,
                        month,
                    },
                )
            }
            _ => {
                let start = NaiveDate::from_ymd_opt(spec.year, 1, 1).ok_or_else(out_of_range)?;
                let end = NaiveDate::from_ymd_opt(spec.year, 12, 31).ok_or_else(out_of_range)?;
                (start, end, TargetView::Year { year: spec.year })
            }
        };

        tracing::debug!(
            start = %range_start,
            end = %range_end,
            granularity = %effective_granularity,
            "Planned report query"
        );
        Ok(PlannedQuery {
            range_start,
            range_end,
            effective_granularity,
            target_view,
            granularity_substituted: substituted,
        })
    }
}
