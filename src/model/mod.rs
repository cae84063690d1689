//! Model definitions for meter report queries and their results.
//!
//! This module provides the query types handed to the planner, the raw and
//! normalized record shapes, and the browser port traits the engine drives.

pub mod records;
pub mod traits;
pub mod types;

// Re-export commonly used items at the module level
pub use records::{ConsumptionRecord, ProductionRecord, RawSeries, RawSeriesPoint, RecordSet};
pub use traits::{BrowserLauncher, LaunchOptions, Locator, PortalDriver};
pub use types::{Credentials, Granularity, Period, QuerySpec};

#[cfg(test)]
mod tests {
    use super::*;

    mod succeeds {
        use super::*;

        #[test]
        fn test_period_display() {
            assert_eq!(Period::Day.to_string(), "day");
            assert_eq!(Period::Month.to_string(), "month");
            assert_eq!(Period::Year.to_string(), "year");
        }

        #[test]
        fn test_portal_codes() {
            assert_eq!(Period::Day.portal_code(), "D");
            assert_eq!(Period::Month.portal_code(), "M");
            assert_eq!(Period::Year.portal_code(), "Y");
            assert_eq!(Granularity::Daily.portal_code(), "D");
            assert_eq!(Granularity::Hourly.portal_code(), "H");
        }

        #[test]
        fn test_query_spec_constructors() {
            let spec = QuerySpec::day(2025, 9, 15);
            assert_eq!(spec.period, Period::Day);
            assert_eq!(spec.month, Some(9));
            assert_eq!(spec.day, Some(15));
            assert_eq!(spec.granularity, None);

            let spec = QuerySpec::year(2025).with_granularity(Granularity::Hourly);
            assert_eq!(spec.month, None);
            assert_eq!(spec.granularity, Some(Granularity::Hourly));
        }

        #[test]
        fn test_credentials_debug_hides_password() {
            let credentials = Credentials::new("user", "hunter2", "obj", "meter").unwrap();
            let debug = format!("{:?}", credentials);
            assert!(debug.contains("user"));
            assert!(!debug.contains("hunter2"));
        }

        #[test]
        fn test_consumption_only_serializes_without_production() {
            let set = RecordSet::ConsumptionOnly(vec![ConsumptionRecord {
                date: "2025-09-15 00:00".to_string(),
                consumption: 1.2,
            }]);
            let json = serde_json::to_value(&set).unwrap();
            assert_eq!(
                json,
                serde_json::json!([{"date": "2025-09-15 00:00", "consumption": 1.2}])
            );
            assert!(!set.has_production());
        }

        #[test]
        fn test_with_production_serializes_as_array() {
            let set = RecordSet::WithProduction(vec![ProductionRecord {
                date: "2025-09-15 00:00".to_string(),
                consumption: 1.2,
                production: 3.0,
            }]);
            let json = serde_json::to_value(&set).unwrap();
            assert_eq!(json[0]["production"].as_f64(), Some(3.0));
            assert_eq!(set.len(), 1);
            assert_eq!(set.dates(), vec!["2025-09-15 00:00"]);
        }
    }

    mod fails {
        use super::*;

        #[test]
        fn test_credentials_reject_blank_values() {
            let err = Credentials::new("user", "pw", "  ", "meter").unwrap_err();
            assert!(err.to_string().contains("EST_OBJECT_ID"));
        }
    }
}
