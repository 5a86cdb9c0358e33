use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseWarning;
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDate {
    Known(NaiveDateTime),
    /// The source value was missing or could not be parsed.
    Unknown,
}

impl AdmissionDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Known(at) => Some(at.date()),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub admitted: AdmissionDate,
    pub total_value: Option<f64>,
    pub age: Option<i64>,
    pub municipality: Option<String>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(schema::numeric_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Real,
    Synthetic,
}

impl DatasetKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Synthetic => "synthetic",
        }
    }
}

// Immutable once loaded; filtering goes through DatasetView.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    records: Vec<Record>,
    warnings: Vec<ParseWarning>,
}

impl Dataset {
    pub fn empty(kind: DatasetKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_records(kind: DatasetKind, records: Vec<Record>) -> Self {
        Self {
            kind,
            records,
            warnings: Vec::new(),
        }
    }

    pub fn from_rows(kind: DatasetKind, rows: Vec<Map<String, Value>>) -> Self {
        let mut records = Vec::with_capacity(rows.len());
        let mut warnings = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let (record, row_warnings) = schema::record_from_row(index, row);
            records.push(record);
            warnings.extend(row_warnings);
        }
        Self {
            kind,
            records,
            warnings,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_region(&self) -> bool {
        self.records.iter().any(|r| r.municipality.is_some())
    }

    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            kind: self.kind,
            records: self.records.iter().collect(),
        }
    }

    pub fn to_rows(&self) -> Vec<Map<String, Value>> {
        self.records.iter().map(|r| r.fields.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    pub kind: DatasetKind,
    pub records: Vec<&'a Record>,
}

impl DatasetView<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// `{"status": "error", "message": ...}`: no real data, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorIndicator {
    pub status: String,
    pub message: String,
}

impl ErrorIndicator {
    pub const STATUS: &'static str = "error";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Self::STATUS.to_string(),
            message: message.into(),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.get("status").and_then(Value::as_str) != Some(Self::STATUS) {
            return None;
        }
        let message = match object.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Some(Self::new(message))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub count: usize,
    pub revenue_millions: f64,
    /// Approximation, see `indicators::indicator_set`.
    pub unique_patients: usize,
    pub average_time: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<AggregatePoint>,
}

/// Current dashboard selection. `region == None` means all regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HospitalRow {
    pub name: &'static str,
    pub city: &'static str,
    pub region: &'static str,
    pub beds: u32,
    pub occupancy: f64,
    pub admissions: u32,
    pub revenue: &'static str,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_indicator_shape_is_recognised() {
        let indicator = ErrorIndicator::from_value(&json!({"status": "error", "message": "boom"}));
        assert_eq!(indicator, Some(ErrorIndicator::new("boom")));
        assert!(ErrorIndicator::from_value(&json!({"status": "online"})).is_none());
        assert!(ErrorIndicator::from_value(&json!([{"status": "error"}])).is_none());
    }

    #[test]
    fn dataset_rows_survive_bad_fields() {
        let rows = vec![
            json!({"Data_Internacao": "2023-01-01", "VAL_TOT": 1}),
            json!({"Data_Internacao": "garbage"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        let dataset = Dataset::from_rows(DatasetKind::Real, rows);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.warnings().len(), 1);
        assert_eq!(dataset.records()[1].admitted, AdmissionDate::Unknown);
    }
}
