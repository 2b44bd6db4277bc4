use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use trendlens_core::metrics::MetricRow;

use crate::schema::init_sql;

/// A DuckDB-backed metrics store.
///
/// DuckDB is single-writer, so the connection sits behind
/// `Arc<Mutex<_>>`: ingest writes are serialised and the struct can be shared
/// across Axum handlers and concurrent metric analyses.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Upsert a batch of daily rows for `site_id` in a single transaction.
    ///
    /// A row whose (date, channel, device, geo, landing page) already exists
    /// replaces the stored counters, so a connector can re-send a day without
    /// double counting. Missing tags are stored as `''`.
    ///
    /// Returns the number of rows written; an empty batch is a no-op.
    pub async fn upsert_daily_rows(&self, site_id: &str, rows: &[MetricRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        for row in rows {
            tx.execute(
                r#"INSERT INTO daily_metrics (
                    site_id, date,
                    channel, device, geo, landing_page,
                    sessions, users, new_users, events, conversions,
                    bounce_rate, avg_session_duration, pages_per_session
                ) VALUES (
                    ?1, CAST(?2 AS DATE),
                    COALESCE(?3, ''), COALESCE(?4, ''), COALESCE(?5, ''), COALESCE(?6, ''),
                    ?7, ?8, ?9, ?10, ?11,
                    ?12, ?13, ?14
                )
                ON CONFLICT (site_id, date, channel, device, geo, landing_page) DO UPDATE SET
                    sessions = EXCLUDED.sessions,
                    users = EXCLUDED.users,
                    new_users = EXCLUDED.new_users,
                    events = EXCLUDED.events,
                    conversions = EXCLUDED.conversions,
                    bounce_rate = EXCLUDED.bounce_rate,
                    avg_session_duration = EXCLUDED.avg_session_duration,
                    pages_per_session = EXCLUDED.pages_per_session"#,
                duckdb::params![
                    site_id,
                    row.date.format("%Y-%m-%d").to_string(),
                    row.channel,
                    row.device,
                    row.geo,
                    row.landing_page,
                    row.sessions,
                    row.users,
                    row.new_users,
                    row.events,
                    row.conversions,
                    row.bounce_rate,
                    row.avg_session_duration,
                    row.pages_per_session,
                ],
            )?;
        }

        tx.commit()?;
        info!(site_id, rows = rows.len(), "Upserted daily metric rows");
        Ok(rows.len())
    }

    /// Execute `SELECT 1` as a lightweight liveness check for `/health`.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
