use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::models::ErrorIndicator;

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreDocument {
    Records(Vec<Row>),
    Error(ErrorIndicator),
}

impl StoreDocument {
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StoreError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        if let Some(indicator) = ErrorIndicator::from_value(&value) {
            return Ok(Self::Error(indicator));
        }

        match value {
            Value::Array(items) => {
                let mut rows = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(row) => rows.push(row),
                        other => {
                            return Err(StoreError::Malformed(format!(
                                "row {index} is not an object: {other}"
                            )))
                        }
                    }
                }
                Ok(Self::Records(rows))
            }
            Value::Object(_) => Err(StoreError::Malformed(
                "expected a list of records or an error indicator".to_string(),
            )),
            other => Err(StoreError::Malformed(format!(
                "unexpected document type: {other}"
            ))),
        }
    }

    pub fn into_rows(self) -> Result<Vec<Row>, StoreError> {
        match self {
            Self::Records(rows) => Ok(rows),
            Self::Error(indicator) => Err(StoreError::Unavailable(indicator.message)),
        }
    }
}

pub async fn read(path: &Path) -> Result<StoreDocument, StoreError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotProcessed)
        }
        Err(e) => return Err(StoreError::Io(e)),
    };
    StoreDocument::parse(&text)
}

pub fn write_records(path: &Path, rows: &[Row]) -> Result<(), StoreError> {
    let text = serde_json::to_string(rows).map_err(|e| StoreError::Malformed(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn write_error(path: &Path, indicator: &ErrorIndicator) -> Result<(), StoreError> {
    let text =
        serde_json::to_string(indicator).map_err(|e| StoreError::Malformed(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Give every row the same column set; cells a row lacks become `null`.
pub fn normalize_rows(rows: Vec<Row>) -> Vec<Row> {
    let columns: BTreeSet<String> = rows.iter().flat_map(|row| row.keys().cloned()).collect();

    rows.into_iter()
        .map(|mut row| {
            for column in &columns {
                if !row.contains_key(column) {
                    row.insert(column.clone(), Value::Null);
                }
            }
            row
        })
        .collect()
}
