use anyhow::{Context, Result};
use chrono::NaiveDate;

use trendlens_core::metrics::MetricRow;

use crate::DuckDbBackend;

type RawRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

/// Rows for `site_id` with `date >= since`, newest first.
pub async fn fetch_daily_rows_inner(
    db: &DuckDbBackend,
    site_id: &str,
    since: NaiveDate,
) -> Result<Vec<MetricRow>> {
    let conn = db.conn.lock().await;
    let since_str = since.format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare(
        r#"
        SELECT
            CAST(date AS VARCHAR),
            NULLIF(channel, ''), NULLIF(device, ''), NULLIF(geo, ''), NULLIF(landing_page, ''),
            sessions, users, new_users, events, conversions,
            bounce_rate, avg_session_duration, pages_per_session
        FROM daily_metrics
        WHERE site_id = ?1
          AND date >= CAST(?2 AS DATE)
        ORDER BY date DESC
        "#,
    )?;

    let raw = stmt.query_map(duckdb::params![site_id, since_str], |row| -> duckdb::Result<RawRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
        ))
    })?;

    let mut rows = Vec::new();
    for r in raw {
        let r = r?;
        let date = NaiveDate::parse_from_str(&r.0, "%Y-%m-%d")
            .with_context(|| format!("invalid date in daily_metrics: {}", r.0))?;
        rows.push(MetricRow {
            date,
            channel: r.1,
            device: r.2,
            geo: r.3,
            landing_page: r.4,
            sessions: r.5,
            users: r.6,
            new_users: r.7,
            events: r.8,
            conversions: r.9,
            bounce_rate: r.10,
            avg_session_duration: r.11,
            pages_per_session: r.12,
        });
    }

    Ok(rows)
}
