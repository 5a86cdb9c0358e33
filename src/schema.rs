use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use crate::error::ParseWarning;
use crate::models::{AdmissionDate, Record};

pub const ADMISSION_DATE: &str = "Data_Internacao";
// Raw SIH column, read when the normalized one is absent or null.
pub const ADMISSION_DATE_RAW: &str = "DT_INTER";
pub const TOTAL_VALUE: &str = "VAL_TOT";
pub const AGE: &str = "IDADE";
pub const MUNICIPALITY: &str = "MUNIC_RES";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y", "%Y/%m/%d"];

/// A malformed field becomes `None` or `Unknown` plus a warning; the row is kept.
pub fn record_from_row(row_index: usize, fields: Map<String, Value>) -> (Record, Vec<ParseWarning>) {
    let mut warnings = Vec::new();

    let admitted = match admission_value(&fields) {
        None => AdmissionDate::Unknown,
        Some((name, value)) => match parse_admission(value) {
            Some(at) => AdmissionDate::Known(at),
            None => {
                warnings.push(warning(row_index, name, value, "unparseable admission date"));
                AdmissionDate::Unknown
            }
        },
    };

    let total_value = read_number(&fields, TOTAL_VALUE, row_index, &mut warnings);
    let age = read_number(&fields, AGE, row_index, &mut warnings).and_then(|age| {
        if age.fract() == 0.0 {
            Some(age as i64)
        } else {
            warnings.push(ParseWarning {
                row: row_index,
                field: AGE.to_string(),
                value: age.to_string(),
                reason: "age is not a whole number",
            });
            None
        }
    });

    let municipality = match fields.get(MUNICIPALITY) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            warnings.push(warning(row_index, MUNICIPALITY, other, "municipality is not text"));
            None
        }
    };

    let record = Record {
        admitted,
        total_value,
        age,
        municipality,
        fields,
    };
    (record, warnings)
}

fn admission_value(fields: &Map<String, Value>) -> Option<(&'static str, &Value)> {
    [ADMISSION_DATE, ADMISSION_DATE_RAW]
        .into_iter()
        .find_map(|name| fields.get(name).filter(|v| !v.is_null()).map(|v| (name, v)))
}

fn read_number(
    fields: &Map<String, Value>,
    name: &str,
    row_index: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<f64> {
    let value = fields.get(name)?;
    if value.is_null() {
        return None;
    }
    let parsed = numeric_value(value);
    if parsed.is_none() {
        warnings.push(warning(row_index, name, value, "not a number"));
    }
    parsed
}

pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn parse_admission(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_time(s),
        Value::Number(n) => n.as_u64().and_then(|v| parse_date_time(&v.to_string())),
        _ => None,
    }
}

pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.naive_local());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(s, format) {
            return Some(at);
        }
    }
    parse_date(s).map(|d| d.and_time(NaiveTime::default()))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

fn warning(row: usize, field: &str, value: &Value, reason: &'static str) -> ParseWarning {
    ParseWarning {
        row,
        field: field.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for input in ["2023-01-01", "20230101", "01/01/2023", "2023-01-01T00:00:00"] {
            let parsed = parse_date_time(input).unwrap();
            assert_eq!(parsed.date(), expected, "input {input}");
        }
        assert_eq!(
            parse_admission(&json!(20230101)).map(|at| at.date()),
            Some(expected)
        );
    }

    #[test]
    fn bad_date_becomes_unknown_with_warning() {
        let (record, warnings) = record_from_row(
            4,
            row(json!({"Data_Internacao": "not a date", "VAL_TOT": 10})),
        );
        assert_eq!(record.admitted, AdmissionDate::Unknown);
        assert_eq!(record.total_value, Some(10.0));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 4);
        assert_eq!(warnings[0].field, ADMISSION_DATE);
    }

    #[test]
    fn missing_date_is_unknown_without_warning() {
        let (record, warnings) = record_from_row(0, row(json!({"VAL_TOT": 1})));
        assert_eq!(record.admitted, AdmissionDate::Unknown);
        assert!(warnings.is_empty());
    }

    #[test]
    fn falls_back_to_raw_admission_column() {
        let (record, _) = record_from_row(0, row(json!({"DT_INTER": "20231205"})));
        assert_eq!(
            record.admitted.date(),
            NaiveDate::from_ymd_opt(2023, 12, 5)
        );
    }

    #[test]
    fn null_normalized_date_uses_raw_column() {
        let (record, warnings) = record_from_row(
            1,
            row(json!({"Data_Internacao": null, "DT_INTER": "20231205", "VAL_TOT": 2})),
        );
        assert!(warnings.is_empty());
        assert_eq!(
            record.admitted.date(),
            NaiveDate::from_ymd_opt(2023, 12, 5)
        );
    }

    #[test]
    fn offset_timestamps_keep_their_local_day() {
        let at = parse_date_time("2023-01-01T23:00:00-03:00").unwrap();
        assert_eq!(at.date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn numeric_strings_and_mixed_municipality() {
        let (record, warnings) = record_from_row(
            0,
            row(json!({"VAL_TOT": "250.75", "IDADE": "34", "MUNIC_RES": 431490})),
        );
        assert!(warnings.is_empty());
        assert_eq!(record.total_value, Some(250.75));
        assert_eq!(record.age, Some(34));
        assert_eq!(record.municipality.as_deref(), Some("431490"));
    }

    #[test]
    fn malformed_number_keeps_row() {
        let (record, warnings) = record_from_row(
            2,
            row(json!({"VAL_TOT": "abc", "IDADE": [1], "extra": true})),
        );
        assert_eq!(record.total_value, None);
        assert_eq!(record.age, None);
        assert_eq!(warnings.len(), 2);
        assert_eq!(record.fields.get("extra"), Some(&json!(true)));
    }
}
