//! Data-source registry and the ingestion endpoints that drive it.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::ingestion::{persist_batch, IngestionBatch, PersistOutcome, SourceInfo, SourceKind};
use crate::response::{ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DataSourceActionRequest {
    /// "test" fetches without storing; "sync" fetches and stores
    pub action: String,
    pub source: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DataSourceActionResponse {
    pub action: String,
    pub source: String,
    pub record_count: usize,
    /// Present for "test"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<IngestionBatch>,
    /// Present for "sync"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<PersistOutcome>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub batch: IngestionBatch,
    pub persisted: PersistOutcome,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngestionQuery {
    /// Single source id; every source of the kind when omitted
    source: Option<String>,
}

/// Registered data sources
#[utoipa::path(
    get,
    path = "/api/data-sources",
    responses((status = 200, description = "All registered adapters", body = Vec<SourceInfo>)),
    tag = "data-sources"
)]
pub async fn list_sources(State(state): State<AppState>) -> ApiResult<Vec<SourceInfo>> {
    ok(state.registry.list())
}

/// Test or sync a data source
#[utoipa::path(
    post,
    path = "/api/data-sources",
    request_body = DataSourceActionRequest,
    responses(
        (status = 200, description = "Action completed", body = DataSourceActionResponse),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Unknown source")
    ),
    tag = "data-sources"
)]
#[tracing::instrument(skip_all, fields(action = %req.action, source = %req.source))]
pub async fn source_action(
    State(state): State<AppState>,
    Json(req): Json<DataSourceActionRequest>,
) -> ApiResult<DataSourceActionResponse> {
    let action = req.action.trim().to_lowercase();
    if action != "test" && action != "sync" {
        return Err(AppError::InvalidRequest(format!(
            "unknown action {:?}; expected \"test\" or \"sync\"",
            req.action
        )));
    }
    let adapter = state
        .registry
        .get(&req.source)
        .ok_or_else(|| AppError::NotFound(format!("data source {}", req.source)))?;

    let batch = adapter.fetch().await;
    let record_count = batch.records.len();

    let (preview, persisted) = if action == "sync" {
        let outcome = persist_batch(&state.db, &batch).await?;
        state.invalidate_dashboard().await;
        (None, Some(outcome))
    } else {
        (Some(batch), None)
    };

    ok(DataSourceActionResponse {
        action,
        source: req.source,
        record_count,
        preview,
        persisted,
    })
}

async fn fetch_for_kind(state: &AppState, kind: SourceKind, source: Option<&str>) -> Result<Vec<IngestionBatch>, AppError> {
    match source.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => {
            let adapter = state
                .registry
                .get(id)
                .filter(|a| a.kind() == kind)
                .ok_or_else(|| AppError::NotFound(format!("{:?} source {}", kind, id)))?;
            Ok(vec![adapter.fetch().await])
        }
        None => Ok(state.registry.fetch_kind(kind).await),
    }
}

/// Conference startup showcases
#[utoipa::path(
    get,
    path = "/api/data-ingestion/conferences",
    params(IngestionQuery),
    responses(
        (status = 200, description = "One batch per conference", body = Vec<IngestionBatch>),
        (status = 404, description = "Unknown conference source")
    ),
    tag = "data-ingestion"
)]
pub async fn ingest_conferences(
    State(state): State<AppState>,
    Query(query): Query<IngestionQuery>,
) -> ApiResult<Vec<IngestionBatch>> {
    ok(fetch_for_kind(&state, SourceKind::Conference, query.source.as_deref()).await?)
}

/// Market intelligence funding feeds
#[utoipa::path(
    get,
    path = "/api/data-ingestion/market-intel",
    params(IngestionQuery),
    responses(
        (status = 200, description = "One batch per feed", body = Vec<IngestionBatch>),
        (status = 404, description = "Unknown market-intel source")
    ),
    tag = "data-ingestion"
)]
pub async fn ingest_market_intel(
    State(state): State<AppState>,
    Query(query): Query<IngestionQuery>,
) -> ApiResult<Vec<IngestionBatch>> {
    ok(fetch_for_kind(&state, SourceKind::MarketIntel, query.source.as_deref()).await?)
}

/// Fetch one source and store its records
#[utoipa::path(
    post,
    path = "/api/data-ingestion/{source}",
    params(("source" = String, Path, description = "Source id, e.g. crunchbase")),
    responses(
        (status = 200, description = "Fetched and stored", body = IngestResponse),
        (status = 404, description = "Unknown source")
    ),
    tag = "data-ingestion"
)]
pub async fn ingest_source(State(state): State<AppState>, Path(source): Path<String>) -> ApiResult<IngestResponse> {
    let adapter = state
        .registry
        .get(&source)
        .ok_or_else(|| AppError::NotFound(format!("data source {}", source)))?;
    let batch = adapter.fetch().await;
    let persisted = persist_batch(&state.db, &batch).await?;
    state.invalidate_dashboard().await;
    ok(IngestResponse { batch, persisted })
}
