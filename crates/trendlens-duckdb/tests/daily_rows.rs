use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use trendlens_core::{
    explain::{Explainer, Status},
    metrics::{MetricKey, MetricRow},
    store::MetricsStore,
};
use trendlens_duckdb::DuckDbBackend;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).expect("date")
}

fn sample_row(date: NaiveDate, channel: &str, users: i64) -> MetricRow {
    MetricRow {
        channel: Some(channel.to_string()),
        device: Some("mobile".to_string()),
        geo: Some("DE".to_string()),
        landing_page: Some("/features?utm_source=news".to_string()),
        sessions: Some(users + 5),
        users: Some(users),
        new_users: None,
        events: Some(users * 3),
        conversions: Some(1),
        bounce_rate: Some(42.5),
        avg_session_duration: Some(63.0),
        pages_per_session: Some(2.4),
        ..MetricRow::empty(date)
    }
}

#[tokio::test]
async fn test_rows_round_trip_newest_first() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let rows = vec![
        sample_row(day(2), "organic", 10),
        sample_row(day(9), "referral", 20),
        sample_row(day(5), "organic", 30),
    ];
    let inserted = db.upsert_daily_rows("site_1", &rows).await.expect("insert");
    assert_eq!(inserted, 3);

    let fetched = db.fetch_daily_rows("site_1", day(1)).await.expect("fetch");
    let dates: Vec<NaiveDate> = fetched.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(9), day(5), day(2)]);

    let newest = &fetched[0];
    assert_eq!(newest.channel.as_deref(), Some("referral"));
    assert_eq!(newest.landing_page.as_deref(), Some("/features?utm_source=news"));
    assert_eq!(newest.users, Some(20));
    assert_eq!(newest.new_users, None);
    assert_eq!(newest.bounce_rate, Some(42.5));
}

#[tokio::test]
async fn test_fetch_respects_since_and_site() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.upsert_daily_rows("site_1", &[sample_row(day(1), "organic", 5), sample_row(day(10), "organic", 5)])
        .await
        .expect("insert site_1");
    db.upsert_daily_rows("site_2", &[sample_row(day(10), "organic", 99)])
        .await
        .expect("insert site_2");

    let fetched = db.fetch_daily_rows("site_1", day(3)).await.expect("fetch");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].date, day(10));
    assert_eq!(fetched[0].users, Some(5));

    assert!(db
        .fetch_daily_rows("site_unknown", day(1))
        .await
        .expect("fetch unknown")
        .is_empty());
}

#[tokio::test]
async fn test_resync_replaces_existing_day() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.upsert_daily_rows("site_1", &[sample_row(day(4), "organic", 100)])
        .await
        .expect("first sync");
    let written = db
        .upsert_daily_rows(
            "site_1",
            &[
                sample_row(day(4), "organic", 120),
                sample_row(day(4), "referral", 30),
            ],
        )
        .await
        .expect("re-sync");
    assert_eq!(written, 2);

    let fetched = db.fetch_daily_rows("site_1", day(1)).await.expect("fetch");
    assert_eq!(fetched.len(), 2);
    let organic = fetched
        .iter()
        .find(|r| r.channel.as_deref() == Some("organic"))
        .expect("organic row");
    assert_eq!(organic.users, Some(120));
    let users: i64 = fetched.iter().filter_map(|r| r.users).sum();
    assert_eq!(users, 150);
}

#[tokio::test]
async fn test_untagged_rows_resync_and_read_back_as_none() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let untagged = |users| MetricRow {
        users: Some(users),
        ..MetricRow::empty(day(6))
    };
    db.upsert_daily_rows("site_1", &[untagged(10)]).await.expect("first");
    db.upsert_daily_rows("site_1", &[untagged(25)]).await.expect("second");

    let fetched = db.fetch_daily_rows("site_1", day(1)).await.expect("fetch");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].users, Some(25));
    assert_eq!(fetched[0].channel, None);
    assert_eq!(fetched[0].device, None);
    assert_eq!(fetched[0].geo, None);
    assert_eq!(fetched[0].landing_page, None);
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    assert_eq!(db.upsert_daily_rows("site_1", &[]).await.expect("insert"), 0);
    let conn = db.conn_for_test().await;
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM daily_metrics", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_explainer_over_duckdb_store() {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("db"));
    let today = day(15);
    let mut rows = Vec::new();
    for offset in 1..=7 {
        rows.push(sample_row(today - Duration::days(offset), "organic", 100));
        rows.push(sample_row(today - Duration::days(offset + 7), "organic", 80));
    }
    db.upsert_daily_rows("site_1", &rows).await.expect("insert");

    let store: Arc<dyn MetricsStore> = db.clone();
    let explainer = Explainer::new(store);
    let e = explainer
        .analyze_metric_on("site_1", MetricKey::ActiveUsers, today)
        .await;

    assert_eq!(e.status, Status::Improving);
    assert_eq!(e.evidence.current_total, 700.0);
    assert_eq!(e.evidence.previous_total, 560.0);
    assert_eq!(e.delta.percent, 25.0);
    assert_eq!(e.top_drivers.len(), 4);
    assert_eq!(e.evidence.top_pages_by_impact[0].label, "/features");

    let missing = explainer
        .analyze_metric_on("site_missing", MetricKey::ActiveUsers, today)
        .await;
    assert_eq!(missing.status, Status::NoData);
}
