use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::config::ExtractionRequest;
use crate::error::ExtractionError;
use crate::models::{Dataset, DatasetKind, ErrorIndicator};
use crate::store::{self, StoreDocument};

#[async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, request: &ExtractionRequest) -> Result<Dataset, ExtractionError>;
}

/// Placeholder for the public SIH download. Always fails.
pub struct StubSource;

#[async_trait]
impl RecordSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn extract(&self, _request: &ExtractionRequest) -> Result<Dataset, ExtractionError> {
        Err(ExtractionError::new(
            "source download unavailable: extractor backend is disabled",
        ))
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn extract(&self, _request: &ExtractionRequest) -> Result<Dataset, ExtractionError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExtractionError::new(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::new(format!("invalid JSON in source file: {e}")))?;

        match StoreDocument::from_value(value) {
            Ok(StoreDocument::Records(rows)) => Ok(Dataset::from_rows(DatasetKind::Real, rows)),
            Ok(StoreDocument::Error(indicator)) => Err(ExtractionError::new(indicator.message)),
            Err(e) => Err(ExtractionError::new(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Stored { rows: usize },
    Failed { message: String },
}

/// Extraction failures end up in the store as an error indicator. Only a
/// failed store write is returned as `Err`.
pub async fn run_extraction(
    source: &dyn RecordSource,
    request: &ExtractionRequest,
    store_path: &Path,
) -> anyhow::Result<ExtractionOutcome> {
    info!(
        source = source.name(),
        region = %request.region,
        year = request.year,
        month = request.month,
        "starting extraction"
    );

    match source.extract(request).await {
        Ok(dataset) => {
            let rows = dataset.to_rows();
            store::write_records(store_path, &rows)?;
            info!(rows = rows.len(), store = %store_path.display(), "records stored");
            Ok(ExtractionOutcome::Stored { rows: rows.len() })
        }
        Err(e) => {
            error!(error = %e, "critical failure during extraction");
            let indicator = ErrorIndicator::new(format!(
                "critical failure running the extractor. Detail: {e}"
            ));
            store::write_error(store_path, &indicator)?;
            info!(store = %store_path.display(), "error status saved for the API");
            Ok(ExtractionOutcome::Failed {
                message: indicator.message,
            })
        }
    }
}
