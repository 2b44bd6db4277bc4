/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `TRENDLENS_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit: the DuckDB default (80% of system RAM) is not acceptable for a
/// server process.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- DAILY METRICS (one row per site, day and dimension combination)
-- ===========================================
-- Written by the ingest endpoint / connector sync; the attribution engine
-- only ever reads it. Re-syncing a day replaces its counters in place.
CREATE TABLE IF NOT EXISTS daily_metrics (
    site_id              VARCHAR NOT NULL,
    date                 DATE NOT NULL,

    -- Dimension tags ('' = untagged, engine applies defaults). NOT NULL so
    -- untagged rows still collide on the primary key.
    channel              VARCHAR NOT NULL DEFAULT '',  -- e.g. 'organic', 'referral', '(none)'
    device               VARCHAR NOT NULL DEFAULT '',  -- 'desktop' | 'mobile' | 'tablet'
    geo                  VARCHAR NOT NULL DEFAULT '',  -- country name or ISO code
    landing_page         VARCHAR NOT NULL DEFAULT '',  -- path, may include a query string

    -- Counters
    sessions             BIGINT,
    users                BIGINT,
    new_users            BIGINT,
    events               BIGINT,
    conversions          BIGINT,
    bounce_rate          DOUBLE,                  -- 0-100
    avg_session_duration DOUBLE,                  -- seconds
    pages_per_session    DOUBLE,

    PRIMARY KEY (site_id, date, channel, device, geo, landing_page)
);

-- Primary query pattern: site + trailing date range, newest first
CREATE INDEX IF NOT EXISTS idx_daily_metrics_site_date
    ON daily_metrics(site_id, date DESC);
"#
    )
}
