use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use trendlens_core::metrics::{validate_site_id, MetricKey};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ExplanationQuery {
    /// IANA zone that decides which calendar day is "today". Defaults to UTC.
    pub timezone: Option<String>,
}

/// Resolve the analysis day for `now` in the requested zone.
fn resolve_today(timezone: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate, AppError> {
    match timezone.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(now.date_naive()),
        Some(raw) => {
            let tz = raw
                .parse::<chrono_tz::Tz>()
                .map_err(|_| AppError::BadRequest("invalid timezone".to_string()))?;
            Ok(now.with_timezone(&tz).date_naive())
        }
    }
}

/// `GET /api/sites/{site_id}/explanations`: every tracked metric.
#[tracing::instrument(skip(state, query))]
pub async fn list_explanations(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    Query(query): Query<ExplanationQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_site_id(&site_id)?;
    let today = resolve_today(query.timezone.as_deref(), Utc::now())?;

    let explanations = state
        .explainer
        .analyze_all_metrics_on(&site_id, today)
        .await;

    Ok(Json(json!({ "data": explanations })))
}

/// `GET /api/sites/{site_id}/explanations/{metric_key}`
#[tracing::instrument(skip(state, query))]
pub async fn get_explanation(
    State(state): State<Arc<AppState>>,
    Path((site_id, metric_key)): Path<(String, String)>,
    Query(query): Query<ExplanationQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_site_id(&site_id)?;
    let metric: MetricKey = metric_key.parse()?;
    let today = resolve_today(query.timezone.as_deref(), Utc::now())?;

    let explanation = state
        .explainer
        .analyze_metric_on(&site_id, metric, today)
        .await;

    Ok(Json(json!({ "data": explanation })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn late_evening_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn missing_or_blank_timezone_uses_utc() {
        let now = late_evening_utc();
        let expected = NaiveDate::from_ymd_opt(2026, 3, 10).expect("date");
        assert_eq!(resolve_today(None, now).expect("none"), expected);
        assert_eq!(resolve_today(Some("  "), now).expect("blank"), expected);
    }

    #[test]
    fn timezone_shifts_the_analysis_day() {
        let now = late_evening_utc();
        let tokyo = resolve_today(Some("Asia/Tokyo"), now).expect("tokyo");
        assert_eq!(tokyo, NaiveDate::from_ymd_opt(2026, 3, 11).expect("date"));
        let la = resolve_today(Some("America/Los_Angeles"), now).expect("la");
        assert_eq!(la, NaiveDate::from_ymd_opt(2026, 3, 10).expect("date"));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = resolve_today(Some("Mars/Olympus"), late_evening_utc()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "invalid timezone"));
    }
}
