use async_trait::async_trait;
use chrono::NaiveDate;

use trendlens_core::metrics::MetricRow;
use trendlens_core::store::MetricsStore;

use crate::DuckDbBackend;

#[async_trait]
impl MetricsStore for DuckDbBackend {
    async fn fetch_daily_rows(
        &self,
        site_id: &str,
        since: NaiveDate,
    ) -> anyhow::Result<Vec<MetricRow>> {
        crate::queries::daily_rows::fetch_daily_rows_inner(self, site_id, since).await
    }
}
