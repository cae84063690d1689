use serde_derive::Serialize;

/// One chart sample exactly as the portal labelled it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeriesPoint {
    pub label: String,
    pub value: f64,
}

impl RawSeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// The A+ and A- series read from one report page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub consumption: Vec<RawSeriesPoint>,
    pub production: Vec<RawSeriesPoint>,
}

impl RawSeries {
    pub fn is_empty(&self) -> bool {
        self.consumption.is_empty() && self.production.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionRecord {
    pub date: String,
    pub consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRecord {
    pub date: String,
    pub consumption: f64,
    pub production: f64,
}

/// Normalized output of one run, ordered by date.
///
/// Accounts without generation equipment get `ConsumptionOnly`, so no record
/// carries a production field at all. Serializes as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordSet {
    WithProduction(Vec<ProductionRecord>),
    ConsumptionOnly(Vec<ConsumptionRecord>),
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::WithProduction(records) => records.len(),
            RecordSet::ConsumptionOnly(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_production(&self) -> bool {
        matches!(self, RecordSet::WithProduction(_))
    }

    /// Dates in output order.
    pub fn dates(&self) -> Vec<&str> {
        match self {
            RecordSet::WithProduction(records) => {
                records.iter().map(|r| r.date.as_str()).collect()
            }
            RecordSet::ConsumptionOnly(records) => {
                records.iter().map(|r| r.date.as_str()).collect()
            }
        }
    }
}
