//! Analysis orchestration: load, split, attribute, score and render.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::{debug, error};

use crate::metrics::MetricKey;
use crate::store::MetricsStore;

use super::drivers::DriverBreakdown;
use super::window::{self, TimeWindow};
use super::{
    confidence, recommendations, summary, Confidence, Evidence, Explanation, MetricDelta, Status,
};

/// Explains metric movements for a site. Stateless apart from the store
/// handle, so one instance can serve every request.
#[derive(Clone)]
pub struct Explainer {
    store: Arc<dyn MetricsStore>,
}

impl Explainer {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }

    /// Explain `metric` over the week ending today (UTC).
    pub async fn analyze_metric(&self, site_id: &str, metric: MetricKey) -> Explanation {
        self.analyze_metric_on(site_id, metric, Utc::now().date_naive())
            .await
    }

    /// Explain `metric` with `today` as the reference date.
    ///
    /// Never fails: load or analysis errors come back as a `Status::Error`
    /// explanation carrying the detail in `error`.
    pub async fn analyze_metric_on(
        &self,
        site_id: &str,
        metric: MetricKey,
        today: NaiveDate,
    ) -> Explanation {
        match self.try_analyze(site_id, metric, today).await {
            Ok(explanation) => {
                debug!(
                    site_id,
                    metric_key = %metric,
                    status = ?explanation.status,
                    confidence = explanation.confidence.score,
                    "metric explained"
                );
                explanation
            }
            Err(err) => {
                let detail = format!("{err:#}");
                error!(site_id, metric_key = %metric, error = %detail, "metric analysis failed");
                failed(metric, detail)
            }
        }
    }

    /// Explain every tracked metric concurrently.
    pub async fn analyze_all_metrics(&self, site_id: &str) -> BTreeMap<MetricKey, Explanation> {
        self.analyze_all_metrics_on(site_id, Utc::now().date_naive())
            .await
    }

    pub async fn analyze_all_metrics_on(
        &self,
        site_id: &str,
        today: NaiveDate,
    ) -> BTreeMap<MetricKey, Explanation> {
        let [active, events, new_users, lead_time] = MetricKey::ALL;
        let (a, b, c, d) = tokio::join!(
            self.analyze_metric_on(site_id, active, today),
            self.analyze_metric_on(site_id, events, today),
            self.analyze_metric_on(site_id, new_users, today),
            self.analyze_metric_on(site_id, lead_time, today),
        );
        BTreeMap::from([(active, a), (events, b), (new_users, c), (lead_time, d)])
    }

    async fn try_analyze(
        &self,
        site_id: &str,
        metric: MetricKey,
        today: NaiveDate,
    ) -> anyhow::Result<Explanation> {
        let rows = self
            .store
            .fetch_daily_rows(site_id, window::lookback_start(today))
            .await
            .context("failed to load daily metric rows")?;
        if rows.is_empty() {
            return Ok(no_data(metric));
        }

        let window = TimeWindow::split(rows, today);
        if window.is_empty() {
            return Ok(no_data(metric));
        }

        let current_total = metric.total(&window.current);
        let previous_total = metric.total(&window.previous);
        anyhow::ensure!(
            current_total.is_finite() && previous_total.is_finite(),
            "metric totals overflowed"
        );

        let delta = MetricDelta::between(previous_total, current_total);
        let status = Status::from_percent(delta.percent);

        let breakdown = DriverBreakdown::compute(
            &window.current,
            &window.previous,
            metric,
            current_total - previous_total,
        );
        let top_drivers = breakdown.top_drivers();

        let (current_days, previous_days) = window.day_counts();
        let confidence = confidence::score(
            current_days,
            previous_days,
            &top_drivers,
            delta.percent,
        );

        let evidence = Evidence {
            top_pages_by_impact: breakdown.top_pages(),
            top_sources_by_impact: breakdown.top_sources(),
            current_total,
            previous_total,
            current_rows: window.current.len(),
            previous_rows: window.previous.len(),
            current_start: Some(window::current_start(today)),
            previous_start: Some(window::lookback_start(today)),
        };

        Ok(Explanation {
            metric_key: metric,
            status,
            summary: summary::summarize(metric, status, &delta, &top_drivers),
            detailed_summary: summary::summarize_detailed(metric, status, &delta, &top_drivers),
            recommendations: recommendations::recommend(status, &breakdown),
            delta,
            top_drivers,
            evidence,
            confidence,
            last_updated: Utc::now(),
            error: None,
        })
    }
}

fn no_data(metric: MetricKey) -> Explanation {
    let delta = MetricDelta::zero();
    let summary = summary::summarize(metric, Status::NoData, &delta, &[]);
    Explanation {
        metric_key: metric,
        status: Status::NoData,
        delta,
        detailed_summary: summary.clone(),
        summary,
        top_drivers: Vec::new(),
        evidence: Evidence::default(),
        recommendations: recommendations::recommend(Status::NoData, &DriverBreakdown::default()),
        confidence: Confidence::none(),
        last_updated: Utc::now(),
        error: None,
    }
}

/// Terminal failure state. The user-facing text stays generic; `detail` is
/// only exposed through `Explanation::error`.
fn failed(metric: MetricKey, detail: String) -> Explanation {
    let delta = MetricDelta::zero();
    let summary = summary::summarize(metric, Status::Error, &delta, &[]);
    Explanation {
        metric_key: metric,
        status: Status::Error,
        delta,
        detailed_summary: summary.clone(),
        summary,
        top_drivers: Vec::new(),
        evidence: Evidence::default(),
        recommendations: Vec::new(),
        confidence: Confidence::none(),
        last_updated: Utc::now(),
        error: Some(detail),
    }
}
