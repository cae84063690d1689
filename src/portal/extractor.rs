//! Report page extraction.
//!
//! Navigates an authenticated tab to the consumption chart, waits until the
//! chart carries its data attribute, and reads the A+ (consumption) and A-
//! (production) series from the embedded JSON.

use crate::error::{AuthenticationError, ConfigError, ExtractionError, Result};
use crate::model::{PortalDriver, RawSeries, RawSeriesPoint};
use crate::portal::helper::parse_decimal;
use crate::portal::html_parsing::{classify_report_page, ReportPage};
use crate::portal::query_planner::PlannedQuery;
use crate::portal::wait::poll_until;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Path of the consumption chart page.
pub const REPORT_PATH: &str = "/lv/private/paterini-un-norekini/paterinu-grafiki/";

const CONSUMPTION_SERIES: &str = "A+";
const PRODUCTION_SERIES: &str = "A-";

/// Outcome of waiting for the chart.
enum Rendered {
    Payload(String),
    NoData,
}

#[derive(Debug, Clone)]
pub struct DataExtractor {
    report_url: Url,
    object_id: String,
    meter_id: String,
    render_timeout: Duration,
    poll_interval: Duration,
}

impl DataExtractor {
    pub fn new(
        base_url: &str,
        object_id: impl Into<String>,
        meter_id: impl Into<String>,
        render_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, ConfigError> {
        let report_url = Url::parse(base_url)
            .and_then(|base| base.join(REPORT_PATH))
            .map_err(|err| ConfigError::invalid("EST_BASE_URL", err.to_string()))?;
        Ok(Self {
            report_url,
            object_id: object_id.into(),
            meter_id: meter_id.into(),
            render_timeout,
            poll_interval,
        })
    }

    /// Chart page URL for `plan`, keyed by the configured object and meter.
    pub fn report_url(&self, plan: &PlannedQuery) -> Url {
        let mut url = self.report_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair("objectEic", &self.object_id);
            query.append_pair("counterNumber", &self.meter_id);
            for (key, value) in plan.portal_params() {
                query.append_pair(key, &value);
            }
        }
        url
    }

    async fn probe(&self, driver: &dyn PortalDriver, url: &Url) -> Result<Option<Rendered>> {
        let current_url = driver.current_url().await?;
        let html = driver.page_source().await?;
        match classify_report_page(&current_url, &html, &self.object_id, &self.meter_id)? {
            ReportPage::Ready(payload) => Ok(Some(Rendered::Payload(payload))),
            ReportPage::NoData => Ok(Some(Rendered::NoData)),
            ReportPage::Loading => Ok(None),
            ReportPage::UnknownAsset(reason) => Err(ExtractionError::unknown_asset(
                self.object_id.as_str(),
                self.meter_id.as_str(),
                reason,
            )
            .into()),
            ReportPage::LoginRequired => Err(AuthenticationError::SessionExpired {
                url: url.to_string(),
            }
            .into()),
        }
    }

    /// Reads both series for `plan` from the live portal.
    ///
    /// An empty range is not an error and yields empty series. A redirect to
    /// the login page ends the run; the session is not silently renewed.
    pub async fn extract(&self, driver: &dyn PortalDriver, plan: &PlannedQuery) -> Result<RawSeries> {
        let url = self.report_url(plan);
        tracing::info!(
            object_id = %self.object_id,
            meter_id = %self.meter_id,
            start = %plan.range_start,
            end = %plan.range_end,
            "Opening consumption chart"
        );
        driver.goto(url.as_str()).await?;

        let rendered = poll_until(self.render_timeout, self.poll_interval, || {
            self.probe(driver, &url)
        })
        .await?;

        let series = match rendered {
            Some(Rendered::Payload(payload)) => parse_chart_payload(&payload)?,
            Some(Rendered::NoData) => {
                tracing::info!("Portal reports no readings for the requested range");
                RawSeries::default()
            }
            None => {
                return Err(ExtractionError::timeout(url.as_str(), self.render_timeout).into());
            }
        };
        tracing::info!(
            consumption = series.consumption.len(),
            production = series.production.len(),
            "Read chart series"
        );
        Ok(series)
    }
}

fn number_of(value: &Value) -> Result<f64, ExtractionError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| ExtractionError::malformed_payload(format!("value {} is not finite", number))),
        Value::String(text) => parse_decimal(text)
            .ok_or_else(|| ExtractionError::malformed_payload(format!("value '{}' is not a number", text))),
        other => Err(ExtractionError::malformed_payload(format!(
            "value {} is not a number",
            other
        ))),
    }
}

fn label_of(value: &Value) -> Result<String, ExtractionError> {
    match value {
        Value::Number(number) => Ok(match number.as_i64() {
            Some(integer) => integer.to_string(),
            None => format!("{:.0}", number.as_f64().unwrap_or_default()),
        }),
        Value::String(text) => Ok(text.clone()),
        other => Err(ExtractionError::malformed_payload(format!(
            "timestamp {} is neither a number nor text",
            other
        ))),
    }
}

fn read_series(values: &Value, name: &str) -> Result<Vec<RawSeriesPoint>, ExtractionError> {
    let Some(series) = values.get(name) else {
        return Ok(Vec::new());
    };
    let data = series
        .pointer("/total/data")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::malformed_payload(format!("{} has no total.data array", name)))?;
    data.iter()
        .map(|item| {
            let timestamp = item
                .get("timestamp")
                .ok_or_else(|| ExtractionError::malformed_payload(format!("{} point without timestamp", name)))?;
            let value = item.get("value").unwrap_or(&Value::Null);
            Ok(RawSeriesPoint::new(label_of(timestamp)?, number_of(value)?))
        })
        .collect()
}

/// Parses the chart's `data-values` JSON.
///
/// # Format
/// ```json
/// {"values":{"A+":{"total":{"data":[{"timestamp":1757894400000,"value":0.42}]}},"A-":{...}}}
/// ```
///
/// `values` is an empty array when the range has no readings, and `A-` is
/// absent for accounts without generation.
pub fn parse_chart_payload(payload: &str) -> Result<RawSeries, ExtractionError> {
    let document: Value = serde_json::from_str(payload).map_err(ExtractionError::malformed_payload)?;
    let values = document
        .get("values")
        .ok_or_else(|| ExtractionError::malformed_payload("missing 'values'"))?;

    match values {
        Value::Array(items) if items.is_empty() => Ok(RawSeries::default()),
        Value::Object(_) => Ok(RawSeries {
            consumption: read_series(values, CONSUMPTION_SERIES)?,
            production: read_series(values, PRODUCTION_SERIES)?,
        }),
        other => Err(ExtractionError::malformed_payload(format!(
            "'values' has unexpected shape {}",
            other
        ))),
    }
}
