//! Metrics store abstraction.

use chrono::NaiveDate;

use crate::metrics::MetricRow;

/// Read-only source of daily metric rows.
///
/// The engine never writes through this trait. Implementations must return
/// rows with `date >= since`, newest first.
#[async_trait::async_trait]
pub trait MetricsStore: Send + Sync + 'static {
    async fn fetch_daily_rows(
        &self,
        site_id: &str,
        since: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRow>>;
}
