use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::store::{self, Row};

pub const RECORDS_ROUTE: &str = "/api/internacoes";
pub const STATUS_ROUTE: &str = "/status";

#[derive(Clone)]
pub struct AppState {
    store_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: Arc::new(store_path.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(RECORDS_ROUTE, get(get_records))
        .route(STATUS_ROUTE, get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("parse host:port")?;

    let app = router(AppState::new(config.store_path.clone()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!(store = %config.store_path.display(), "listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// Re-reads the store on every call.
async fn get_records(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = store::read(&state.store_path)
        .await
        .and_then(|doc| doc.into_rows())
        .map_err(|e| {
            let err = ApiError::from(e);
            warn!(status = err.status().as_u16(), error = %err, "records request failed");
            err
        })?;

    Ok(Json(store::normalize_rows(rows)))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        message: "SUS data API is online.",
    })
}
