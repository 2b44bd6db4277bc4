use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use trendlens_core::metrics::{validate_site_id, MetricRow};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    pub rows: Vec<MetricRow>,
}

/// `POST /api/sites/{site_id}/daily-metrics`: upsert daily rows from a
/// connector sync.
///
/// The whole batch is validated before anything is written, so a rejected
/// request leaves the table untouched.
#[tracing::instrument(skip(state, payload), fields(rows = payload.rows.len()))]
pub async fn ingest_daily_metrics(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    Json(payload): Json<IngestPayload>,
) -> Result<impl IntoResponse, AppError> {
    validate_site_id(&site_id)?;

    let max = state.config.ingest_max_rows;
    if payload.rows.len() > max {
        return Err(AppError::BatchTooLarge {
            count: payload.rows.len(),
            max,
        });
    }
    for row in &payload.rows {
        row.validate()?;
    }

    let inserted = state.db.upsert_daily_rows(&site_id, &payload.rows).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "inserted": inserted } })),
    ))
}
