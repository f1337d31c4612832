//! HTTP front end: one route per source, answered by a live aggregation.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | `{"message": "job feed aggregator running"}` |
//! | `GET /jobs/{source}` | JSON array of postings |
//!
//! `{source}` accepts the canonical names and the `<name>jobs` aliases
//! (`remotivejobs`, `remoteokjobs`, ...). A source that could not be fetched
//! answers 502, a source with no postings and an unknown source answer 404.
//! Error bodies are `{"error": ..., "source": ...}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::aggregate;
use crate::config::Config;
use crate::feed::FeedClient;
use crate::model::{JobPosting, Source};
use crate::snapshot::{PartitionKey, SnapshotSink};
use crate::sources::adapter_for;

pub const HEALTH_MESSAGE: &str = "job feed aggregator running";
pub const NO_POSTINGS_MESSAGE: &str = "no job postings found";

/// Shared by every request.
pub struct GatewayState {
    pub client: FeedClient,
    pub config: Arc<Config>,
    /// Written after each successful request when set.
    pub sink: Option<Arc<dyn SnapshotSink>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub source: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, source: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            source: source.into(),
        }),
    )
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/jobs/{source}", get(source_jobs))
        .with_state(state)
}

/// Binds `0.0.0.0:{port}` and serves until the process is stopped.
pub async fn serve(state: Arc<GatewayState>, port: u16) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Gateway listening");
    axum::serve(listener, app).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE,
    })
}

async fn source_jobs(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let source: Source = name
        .parse()
        .map_err(|e: crate::model::UnknownSource| api_error(StatusCode::NOT_FOUND, e.to_string(), &name))?;

    let adapter = adapter_for(source, &state.config);
    let result = aggregate::run(adapter.as_ref(), &state.client).await;

    if let Some(reason) = result.failure {
        return Err(api_error(StatusCode::BAD_GATEWAY, reason, source.as_str()));
    }
    if result.postings.is_empty() {
        return Err(api_error(StatusCode::NOT_FOUND, NO_POSTINGS_MESSAGE, source.as_str()));
    }

    if let Some(sink) = &state.sink {
        let partition = PartitionKey::now(state.config.snapshot_hourly);
        if let Err(e) = sink.write(source, &partition, &result.postings).await {
            tracing::warn!(source = %source, error = %e, "Snapshot write failed");
        }
    }

    Ok(Json(result.postings))
}
