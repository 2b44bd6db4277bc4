//! Dimensional drivers.
//!
//! Every dimension runs the same algorithm: group both windows by a key,
//! take the per-key delta, express it as a share of the total change, and
//! keep the keys whose share clears the dimension's threshold. Only the key
//! extraction, label formatting and threshold differ, so each dimension is a
//! [`Dimension`] record rather than its own function.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::metrics::{MetricKey, MetricRow};

use super::{
    format_value, round1, DriverResult, DriverType, MAX_EVIDENCE_PAGES, MAX_EVIDENCE_SOURCES,
    MAX_TOP_DRIVERS,
};

/// Per-key deltas smaller than this are rounding noise.
pub const MIN_DELTA: f64 = 0.01;

/// Landing pages admitted into the blended top-driver ranking.
const MAX_PAGES_IN_TOP_DRIVERS: usize = 3;

const MAX_PAGE_LABEL_CHARS: usize = 60;

pub struct Dimension {
    pub driver_type: DriverType,
    /// Minimum `|contribution_pct|` for a key to be reported.
    pub threshold_pct: f64,
    /// Canonical grouping key. Aliases of the same value must map to one key.
    extract_key: fn(&MetricRow) -> String,
    format_label: fn(&str) -> String,
}

pub const CHANNEL: Dimension = Dimension {
    driver_type: DriverType::Channel,
    threshold_pct: 5.0,
    extract_key: channel_key,
    format_label: verbatim_label,
};

pub const DEVICE: Dimension = Dimension {
    driver_type: DriverType::Device,
    threshold_pct: 5.0,
    extract_key: device_key,
    format_label: device_label,
};

pub const GEOGRAPHY: Dimension = Dimension {
    driver_type: DriverType::Geography,
    threshold_pct: 5.0,
    extract_key: geo_key,
    format_label: verbatim_label,
};

/// Pages use a lower bar so more page-level evidence surfaces.
pub const LANDING_PAGE: Dimension = Dimension {
    driver_type: DriverType::LandingPage,
    threshold_pct: 3.0,
    extract_key: landing_page_key,
    format_label: landing_page_label,
};

/// Canonical channel names, matched case-insensitively on the trimmed tag.
const CHANNEL_LABELS: &[(&str, &str)] = &[
    ("organic", "Organic Search"),
    ("organic search", "Organic Search"),
    ("(none)", "Direct"),
    ("direct", "Direct"),
    ("referral", "Referral"),
    ("social", "Social"),
    ("organic social", "Social"),
    ("paid search", "Paid Search"),
    ("cpc", "Paid Search"),
    ("ppc", "Paid Search"),
    ("paid social", "Paid Social"),
    ("email", "Email"),
    ("display", "Display"),
    ("(not set)", "Unassigned"),
];

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn channel_key(row: &MetricRow) -> String {
    channel_label(non_blank(row.channel.as_deref()).unwrap_or("Direct"))
}

fn device_key(row: &MetricRow) -> String {
    non_blank(row.device.as_deref())
        .unwrap_or("desktop")
        .to_lowercase()
}

fn geo_key(row: &MetricRow) -> String {
    non_blank(row.geo.as_deref()).unwrap_or("Unknown").to_string()
}

fn landing_page_key(row: &MetricRow) -> String {
    strip_query(non_blank(row.landing_page.as_deref()).unwrap_or("/"))
}

/// Reduce a landing page to its path: absolute URLs lose scheme and host,
/// and the query string and fragment are dropped.
pub fn strip_query(raw: &str) -> String {
    if let Ok(parsed) = url::Url::parse(raw) {
        if parsed.has_host() {
            return parsed.path().to_string();
        }
    }
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Known channels map to their display name; anything else keeps its
/// trimmed spelling.
pub fn channel_label(key: &str) -> String {
    let trimmed = key.trim();
    let needle = trimmed.to_lowercase();
    CHANNEL_LABELS
        .iter()
        .find(|(raw, _)| *raw == needle)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

fn device_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn verbatim_label(key: &str) -> String {
    key.to_string()
}

/// `key` is already a bare path from [`landing_page_key`].
fn landing_page_label(key: &str) -> String {
    if key.chars().count() <= MAX_PAGE_LABEL_CHARS {
        return key.to_string();
    }
    let truncated: String = key.chars().take(MAX_PAGE_LABEL_CHARS - 3).collect();
    format!("{truncated}...")
}

fn by_impact(a: &DriverResult, b: &DriverResult) -> Ordering {
    b.contribution_pct
        .abs()
        .partial_cmp(&a.contribution_pct.abs())
        .unwrap_or(Ordering::Equal)
}

/// Stable sort by `|contribution_pct|`, largest first.
pub fn sort_by_impact(drivers: &mut [DriverResult]) {
    drivers.sort_by(by_impact);
}

impl Dimension {
    /// Attribute `total_change` across this dimension's keys.
    ///
    /// Returns nothing when the metric did not move, so no share is ever
    /// computed against a zero denominator.
    pub fn compute(
        &self,
        current: &[MetricRow],
        previous: &[MetricRow],
        metric: MetricKey,
        total_change: f64,
    ) -> Vec<DriverResult> {
        if total_change == 0.0 || !total_change.is_finite() {
            return Vec::new();
        }

        // (previous, current) per key. BTreeMap keeps tie order deterministic.
        let mut groups: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for row in previous {
            groups.entry((self.extract_key)(row)).or_default().0 += metric.value_of(row);
        }
        for row in current {
            groups.entry((self.extract_key)(row)).or_default().1 += metric.value_of(row);
        }

        let mut results: Vec<DriverResult> = groups
            .into_iter()
            .filter_map(|(key, (prev, curr))| {
                let delta = curr - prev;
                if delta.abs() < MIN_DELTA {
                    return None;
                }
                let contribution_pct = round1(delta / total_change * 100.0);
                if contribution_pct.abs() < self.threshold_pct {
                    return None;
                }
                let sign = if delta >= 0.0 { "+" } else { "-" };
                Some(DriverResult {
                    driver_type: self.driver_type,
                    label: (self.format_label)(&key),
                    contribution_pct,
                    delta,
                    value_before: prev,
                    value_after: curr,
                    details: format!(
                        "{} → {} ({sign}{})",
                        format_value(prev),
                        format_value(curr),
                        format_value(delta.abs())
                    ),
                })
            })
            .collect();

        sort_by_impact(&mut results);
        results
    }
}

/// Driver output for every dimension of one metric.
#[derive(Debug, Clone, Default)]
pub struct DriverBreakdown {
    pub channel: Vec<DriverResult>,
    pub device: Vec<DriverResult>,
    pub geography: Vec<DriverResult>,
    pub landing_page: Vec<DriverResult>,
}

impl DriverBreakdown {
    pub fn compute(
        current: &[MetricRow],
        previous: &[MetricRow],
        metric: MetricKey,
        total_change: f64,
    ) -> Self {
        Self {
            channel: CHANNEL.compute(current, previous, metric, total_change),
            device: DEVICE.compute(current, previous, metric, total_change),
            geography: GEOGRAPHY.compute(current, previous, metric, total_change),
            landing_page: LANDING_PAGE.compute(current, previous, metric, total_change),
        }
    }

    /// Blended ranking across dimensions. Landing pages are capped so page
    /// noise cannot crowd out the other dimensions.
    pub fn top_drivers(&self) -> Vec<DriverResult> {
        let mut all: Vec<DriverResult> = self
            .channel
            .iter()
            .chain(&self.device)
            .chain(&self.geography)
            .chain(self.landing_page.iter().take(MAX_PAGES_IN_TOP_DRIVERS))
            .cloned()
            .collect();
        sort_by_impact(&mut all);
        all.truncate(MAX_TOP_DRIVERS);
        all
    }

    pub fn top_pages(&self) -> Vec<DriverResult> {
        self.landing_page
            .iter()
            .take(MAX_EVIDENCE_PAGES)
            .cloned()
            .collect()
    }

    pub fn top_sources(&self) -> Vec<DriverResult> {
        self.channel
            .iter()
            .take(MAX_EVIDENCE_SOURCES)
            .cloned()
            .collect()
    }
}
