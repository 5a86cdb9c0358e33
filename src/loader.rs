use chrono::NaiveDate;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::models::{Dataset, DatasetKind};
use crate::store::StoreDocument;
use crate::synthetic;

pub struct DataLoader {
    client: Client,
    config: LoaderConfig,
}

impl DataLoader {
    pub fn new(config: LoaderConfig) -> Result<Self, LoadError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn fetch(&self) -> Result<Dataset, LoadError> {
        debug!(url = %self.config.api_url, "requesting records");
        let response = self.client.get(&self.config.api_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(LoadError::ServiceUnavailable(error_detail(&body)));
        }
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| LoadError::Decode(e.to_string()))?;
        match StoreDocument::from_value(value) {
            Ok(StoreDocument::Records(rows)) => Ok(Dataset::from_rows(DatasetKind::Real, rows)),
            Ok(StoreDocument::Error(indicator)) => {
                Err(LoadError::ServiceUnavailable(indicator.message))
            }
            Err(e) => Err(LoadError::Decode(e.to_string())),
        }
    }

    /// Real records, or an empty dataset when the API cannot provide any.
    pub async fn load(&self) -> Dataset {
        match self.fetch().await {
            Ok(dataset) => {
                for warning in dataset.warnings() {
                    warn!(%warning, "field parse warning");
                }
                info!(rows = dataset.len(), "loaded records from API");
                dataset
            }
            Err(e) => {
                warn!(error = %e, "could not load records from API");
                Dataset::empty(DatasetKind::Real)
            }
        }
    }

    /// The dataset the dashboard runs on for this process: real records when
    /// there are any, otherwise a synthetic series ending on `today`.
    pub async fn load_active<R: Rng + ?Sized>(&self, today: NaiveDate, rng: &mut R) -> Dataset {
        let dataset = self.load().await;
        if !dataset.is_empty() {
            return dataset;
        }

        let dataset = synthetic::generate(today, self.config.span_days, rng);
        warn!(
            rows = dataset.len(),
            "no real data available, showing synthetic data"
        );
        dataset
    }
}

/// `detail` from an error body, or the raw text when there is none.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
