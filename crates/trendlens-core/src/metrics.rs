//! Daily metric rows and the metric keys the engine can explain.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One day of counters for a site, tagged with the dimensions it was
/// recorded under. Mirrors the `daily_metrics` table column for column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub geo: Option<String>,
    #[serde(default)]
    pub landing_page: Option<String>,
    #[serde(default)]
    pub sessions: Option<i64>,
    #[serde(default)]
    pub users: Option<i64>,
    #[serde(default)]
    pub new_users: Option<i64>,
    #[serde(default)]
    pub events: Option<i64>,
    #[serde(default)]
    pub conversions: Option<i64>,
    /// 0–100.
    #[serde(default)]
    pub bounce_rate: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub avg_session_duration: Option<f64>,
    #[serde(default)]
    pub pages_per_session: Option<f64>,
}

impl MetricRow {
    /// A row for `date` with every tag and counter unset.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            channel: None,
            device: None,
            geo: None,
            landing_page: None,
            sessions: None,
            users: None,
            new_users: None,
            events: None,
            conversions: None,
            bounce_rate: None,
            avg_session_duration: None,
            pages_per_session: None,
        }
    }

    /// Check the counters an ingest client supplied. Tags are free-form.
    pub fn validate(&self) -> Result<(), CoreError> {
        let counters = [
            ("sessions", self.sessions),
            ("users", self.users),
            ("new_users", self.new_users),
            ("events", self.events),
            ("conversions", self.conversions),
        ];
        for (field, value) in counters {
            if value.is_some_and(|v| v < 0) {
                return Err(CoreError::InvalidRow {
                    date: self.date,
                    reason: format!("{field} must be non-negative"),
                });
            }
        }

        if self
            .bounce_rate
            .is_some_and(|v| !v.is_finite() || !(0.0..=100.0).contains(&v))
        {
            return Err(CoreError::InvalidRow {
                date: self.date,
                reason: "bounce_rate must be between 0 and 100".to_string(),
            });
        }

        let ratios = [
            ("avg_session_duration", self.avg_session_duration),
            ("pages_per_session", self.pages_per_session),
        ];
        for (field, value) in ratios {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(CoreError::InvalidRow {
                    date: self.date,
                    reason: format!("{field} must be a non-negative number"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    #[serde(rename = "activeUsers")]
    ActiveUsers,
    #[serde(rename = "eventCount")]
    EventCount,
    #[serde(rename = "newUsers")]
    NewUsers,
    #[serde(rename = "avgTimeToLeadSubmit")]
    AvgTimeToLeadSubmit,
}

impl MetricKey {
    /// Every key tracked for a site, in response order.
    pub const ALL: [MetricKey; 4] = [
        MetricKey::ActiveUsers,
        MetricKey::EventCount,
        MetricKey::NewUsers,
        MetricKey::AvgTimeToLeadSubmit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::ActiveUsers => "activeUsers",
            MetricKey::EventCount => "eventCount",
            MetricKey::NewUsers => "newUsers",
            MetricKey::AvgTimeToLeadSubmit => "avgTimeToLeadSubmit",
        }
    }

    /// Human-readable name used in summaries, lower-case ("active users").
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKey::ActiveUsers => "active users",
            MetricKey::EventCount => "event count",
            MetricKey::NewUsers => "new users",
            MetricKey::AvgTimeToLeadSubmit => "average time to lead submit",
        }
    }

    /// Read this metric's value out of a row.
    ///
    /// `AvgTimeToLeadSubmit` is not derivable from daily traffic rows (lead
    /// latency lives in the CRM), so it always reads as zero.
    pub fn value_of(&self, row: &MetricRow) -> f64 {
        let raw = match self {
            MetricKey::ActiveUsers => row.users.or(row.sessions),
            MetricKey::EventCount => row.events,
            MetricKey::NewUsers => row.new_users.or(row.users),
            MetricKey::AvgTimeToLeadSubmit => None,
        };
        raw.unwrap_or(0) as f64
    }

    /// Sum of this metric over a set of rows.
    pub fn total(&self, rows: &[MetricRow]) -> f64 {
        rows.iter().map(|row| self.value_of(row)).sum()
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .into_iter()
            .find(|key| key.as_str() == raw.trim())
            .ok_or_else(|| CoreError::UnknownMetricKey(raw.to_string()))
    }
}

/// Reject site identifiers that could not have been issued by the dashboard.
pub fn validate_site_id(site_id: &str) -> Result<(), CoreError> {
    let ok = !site_id.is_empty()
        && site_id.len() <= 64
        && site_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(CoreError::InvalidSiteId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("date")
    }

    #[test]
    fn validate_rejects_negative_counters_and_bad_ratios() {
        let mut row = MetricRow::empty(day());
        row.users = Some(3);
        row.bounce_rate = Some(100.0);
        assert_eq!(row.validate(), Ok(()));

        row.events = Some(-1);
        assert_eq!(
            row.validate(),
            Err(CoreError::InvalidRow {
                date: day(),
                reason: "events must be non-negative".to_string(),
            })
        );

        row.events = None;
        row.bounce_rate = Some(140.0);
        assert!(row.validate().is_err());

        row.bounce_rate = None;
        row.pages_per_session = Some(f64::NAN);
        assert!(row.validate().is_err());
    }

    #[test]
    fn active_users_falls_back_to_sessions() {
        let mut row = MetricRow::empty(day());
        row.sessions = Some(12);
        assert_eq!(MetricKey::ActiveUsers.value_of(&row), 12.0);
        row.users = Some(9);
        assert_eq!(MetricKey::ActiveUsers.value_of(&row), 9.0);
    }

    #[test]
    fn new_users_falls_back_to_users() {
        let mut row = MetricRow::empty(day());
        row.users = Some(40);
        assert_eq!(MetricKey::NewUsers.value_of(&row), 40.0);
        row.new_users = Some(15);
        assert_eq!(MetricKey::NewUsers.value_of(&row), 15.0);
    }

    #[test]
    fn missing_counters_read_as_zero() {
        let row = MetricRow::empty(day());
        for key in MetricKey::ALL {
            assert_eq!(key.value_of(&row), 0.0);
        }
    }

    #[test]
    fn lead_submit_latency_is_always_zero() {
        let mut row = MetricRow::empty(day());
        row.users = Some(10);
        row.events = Some(30);
        row.conversions = Some(3);
        assert_eq!(MetricKey::AvgTimeToLeadSubmit.value_of(&row), 0.0);
    }

    #[test]
    fn metric_key_parses_wire_names() {
        assert_eq!("activeUsers".parse::<MetricKey>(), Ok(MetricKey::ActiveUsers));
        assert_eq!(
            "avgTimeToLeadSubmit".parse::<MetricKey>(),
            Ok(MetricKey::AvgTimeToLeadSubmit)
        );
        assert!(matches!(
            "pageviews".parse::<MetricKey>(),
            Err(CoreError::UnknownMetricKey(_))
        ));
    }

    #[test]
    fn metric_key_serializes_as_wire_name() {
        let json = serde_json::to_string(&MetricKey::EventCount).expect("serialize");
        assert_eq!(json, "\"eventCount\"");
    }

    #[test]
    fn site_id_validation() {
        assert!(validate_site_id("site_default").is_ok());
        assert!(validate_site_id("acme-42").is_ok());
        assert_eq!(validate_site_id(""), Err(CoreError::InvalidSiteId));
        assert_eq!(validate_site_id("../etc"), Err(CoreError::InvalidSiteId));
        assert_eq!(validate_site_id(&"x".repeat(65)), Err(CoreError::InvalidSiteId));
    }
}
