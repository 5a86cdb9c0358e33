use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORE_PATH: &str = "sih_records.json";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/internacoes";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SPAN_DAYS: u32 = 28;

/// Region selector value meaning "no region filter".
pub const ALL_REGIONS: &str = "all";

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub api_url: String,
    /// Covers the whole request, connect included.
    pub timeout: Duration,
    pub span_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub region: String,
    pub year: i32,
    pub month: u32,
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        Self {
            region: "RS".to_string(),
            year: 2023,
            month: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_path: PathBuf,
}
