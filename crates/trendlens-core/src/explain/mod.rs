//! Metric change attribution.
//!
//! Explains why a metric moved over the last 7 days by decomposing the change
//! across channel, device, geography and landing page, then scoring the
//! explanation and rendering advice.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricKey;

pub mod confidence;
pub mod drivers;
pub mod engine;
pub mod recommendations;
pub mod summary;
pub mod window;

pub use engine::Explainer;

/// Label attached to every delta; the comparison is always week over week.
pub const TIME_WINDOW_LABEL: &str = "7 days";

/// `|percent| < 5` is treated as noise.
pub const STABLE_BAND_PCT: f64 = 5.0;

pub const MAX_TOP_DRIVERS: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 3;
pub const MAX_EVIDENCE_PAGES: usize = 10;
pub const MAX_EVIDENCE_SOURCES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NoData,
    Stable,
    Improving,
    NeedsAttention,
    Error,
}

impl Status {
    /// Status is a pure function of the (rounded) percent change.
    pub fn from_percent(percent: f64) -> Self {
        if percent.abs() < STABLE_BAND_PCT {
            Status::Stable
        } else if percent > 0.0 {
            Status::Improving
        } else {
            Status::NeedsAttention
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    Channel,
    Device,
    Geography,
    LandingPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverResult {
    pub driver_type: DriverType,
    pub label: String,
    /// Signed share of the total change, one decimal. Positive means this
    /// driver moved in the same direction as the metric.
    pub contribution_pct: f64,
    pub delta: f64,
    pub value_before: f64,
    pub value_after: f64,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub absolute: f64,
    pub percent: f64,
    pub time_window_label: String,
}

impl MetricDelta {
    pub fn zero() -> Self {
        Self {
            absolute: 0.0,
            percent: 0.0,
            time_window_label: TIME_WINDOW_LABEL.to_string(),
        }
    }

    /// Week-over-week change. A zero baseline reports 100% growth when
    /// anything was recorded this week, otherwise 0%.
    pub fn between(previous_total: f64, current_total: f64) -> Self {
        let absolute = current_total - previous_total;
        let percent = if previous_total == 0.0 {
            if current_total > 0.0 {
                100.0
            } else {
                0.0
            }
        } else {
            round1(absolute / previous_total.abs() * 100.0)
        };
        Self {
            absolute: round1(absolute),
            percent,
            time_window_label: TIME_WINDOW_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Med,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    /// 0–100.
    pub score: u8,
}

impl Confidence {
    pub fn none() -> Self {
        Self {
            level: ConfidenceLevel::Low,
            score: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub action: String,
}

/// Longer driver lists kept for the dashboard, independent of the top-5 cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Evidence {
    pub top_pages_by_impact: Vec<DriverResult>,
    pub top_sources_by_impact: Vec<DriverResult>,
    pub current_total: f64,
    pub previous_total: f64,
    pub current_rows: usize,
    pub previous_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub metric_key: MetricKey,
    pub status: Status,
    pub delta: MetricDelta,
    pub summary: String,
    pub detailed_summary: String,
    pub top_drivers: Vec<DriverResult>,
    pub evidence: Evidence,
    pub recommendations: Vec<Recommendation>,
    pub confidence: Confidence,
    pub last_updated: DateTime<Utc>,
    /// Developer-facing failure detail. Never shown to end users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Render a metric value without a trailing `.0` for whole numbers.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
