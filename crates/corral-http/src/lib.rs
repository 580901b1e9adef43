//! corral-http — JSON HTTP surface over the [`Aggregator`].
//!
//! | Route       | Answer                               |
//! |-------------|--------------------------------------|
//! | `/sources`  | `{"data": [stream name]}`            |
//! | `/logs`     | `{"data": [LogRecord]}`              |
//! | `/requests` | `{"data": [RequestGroup]}`           |
//!
//! Failures answer `{"detail": "..."}`; see [`ApiError`] for the status codes.
//! CORS is wide open since the browser UI is served from elsewhere.

pub mod error;

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use corral_core::{group_by_correlation, LogRecord, RequestGroup, SourceKind, TimeWindow};
use corral_feeds::Aggregator;

pub use error::ApiError;

const DEFAULT_ENVIRONMENT: &str = "cloudwatch";

/// Response envelope shared by every route.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct SourcesQuery {
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub environment: Option<String>,
    pub sources: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/sources", get(sources))
        .route("/logs", get(logs))
        .route("/requests", get(requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(aggregator)
}

fn environment(raw: Option<&str>) -> Result<SourceKind, ApiError> {
    Ok(raw.unwrap_or(DEFAULT_ENVIRONMENT).parse()?)
}

async fn sources(
    State(aggregator): State<Arc<Aggregator>>,
    query: Result<Query<SourcesQuery>, QueryRejection>,
) -> Result<Json<Data<Vec<String>>>, ApiError> {
    let Query(query) = query?;
    let kind = environment(query.environment.as_deref())?;
    let data = aggregator.list_streams(kind).await?;
    Ok(Json(Data { data }))
}

async fn logs(
    State(aggregator): State<Arc<Aggregator>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Data<Vec<LogRecord>>>, ApiError> {
    let Query(query) = query?;
    let data = fetch(&aggregator, &query).await?;
    Ok(Json(Data { data }))
}

async fn requests(
    State(aggregator): State<Arc<Aggregator>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Data<Vec<RequestGroup>>>, ApiError> {
    let Query(query) = query?;
    let records = fetch(&aggregator, &query).await?;
    Ok(Json(Data {
        data: group_by_correlation(&records),
    }))
}

async fn fetch(aggregator: &Aggregator, query: &LogsQuery) -> Result<Vec<LogRecord>, ApiError> {
    let kind = environment(query.environment.as_deref())?;
    let streams = split_sources(query.sources.as_deref().unwrap_or_default());
    if streams.is_empty() {
        return Err(ApiError::BadRequest("missing 'sources'".to_string()));
    }
    let start = query
        .start_time
        .ok_or_else(|| ApiError::BadRequest("missing 'start_time'".to_string()))?;
    let window = TimeWindow::from_millis(start, query.end_time)
        .ok_or_else(|| ApiError::BadRequest("time out of range".to_string()))?;

    tracing::debug!(%kind, ?streams, "ingest requested");
    Ok(aggregator.ingest(kind, &streams, window).await?)
}

/// `"a, b,,c"` → `["a", "b", "c"]`
fn split_sources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
