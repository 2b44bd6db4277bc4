use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::metrics::MetricRow;

/// Days in each half of the comparison.
pub const WINDOW_DAYS: i64 = 7;

/// The two halves of a 14-day fetch.
#[derive(Debug, Clone, Default)]
pub struct TimeWindow {
    pub current: Vec<MetricRow>,
    pub previous: Vec<MetricRow>,
}

/// First day that belongs to the fetch (`today - 14d`).
pub fn lookback_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS * 2)
}

/// First day of the current window (`today - 7d`).
pub fn current_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS)
}

impl TimeWindow {
    /// Rows on or after the cutoff are "current", everything earlier is
    /// "previous".
    pub fn split(rows: Vec<MetricRow>, today: NaiveDate) -> Self {
        let cutoff = current_start(today);
        let (current, previous) = rows.into_iter().partition(|row| row.date >= cutoff);
        Self { current, previous }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Distinct calendar days present in (current, previous). A day stored
    /// as several dimension rows counts once.
    pub fn day_counts(&self) -> (usize, usize) {
        (distinct_days(&self.current), distinct_days(&self.previous))
    }
}

fn distinct_days(rows: &[MetricRow]) -> usize {
    rows.iter().map(|row| row.date).collect::<BTreeSet<_>>().len()
}
