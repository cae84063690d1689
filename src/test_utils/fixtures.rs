//! Test fixtures and common test data.
//!
//! Chart payloads in the shape the portal embeds in `div.chart[data-values]`.

use serde_json::{json, Value};

/// Common test identifiers.
pub mod constants {
    pub const OBJECT_ID: &str = "OBJ1";
    pub const METER_ID: &str = "M1";
    pub const USERNAME: &str = "user@example.lv";
    pub const PASSWORD: &str = "correct horse";
    pub const BASE_URL: &str = "https://mans.e-st.lv";

    /// 2025-09-15 00:00 UTC in epoch milliseconds.
    pub const SEP_15_MIDNIGHT_MS: i64 = 1_757_894_400_000;
    pub const HOUR_MS: i64 = 3_600_000;
}

fn series(points: &[(i64, f64)]) -> Value {
    json!({
        "total": {
            "data": points
                .iter()
                .map(|(timestamp, value)| json!({"timestamp": timestamp, "value": value}))
                .collect::<Vec<_>>()
        }
    })
}

/// Payload with an A+ series only.
pub fn consumption_payload(points: &[(i64, f64)]) -> String {
    json!({"values": {"A+": series(points)}}).to_string()
}

/// Payload with both A+ and A- series.
pub fn neto_payload(consumption: &[(i64, f64)], production: &[(i64, f64)]) -> String {
    json!({"values": {"A+": series(consumption), "A-": series(production)}}).to_string()
}

/// What the portal sends for a range without readings.
pub fn empty_payload() -> String {
    r#"{"values":[]}"#.to_string()
}
