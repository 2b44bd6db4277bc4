use crate::metrics::MetricKey;

use super::{DriverResult, DriverType, MetricDelta, Status};

const WINDOW_PHRASE: &str = "the last 7 days";

fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// How a single driver reads inside a sentence.
pub fn driver_phrase(driver: &DriverResult) -> String {
    match driver.driver_type {
        DriverType::Channel if driver.delta >= 0.0 => format!("growth in {} traffic", driver.label),
        DriverType::Channel => format!("a decline in {} traffic", driver.label),
        DriverType::Device => format!("changes in {} users", driver.label.to_lowercase()),
        DriverType::Geography => format!("changes in traffic from {}", driver.label),
        DriverType::LandingPage => format!("your {} page", driver.label),
    }
}

/// One-sentence explanation keyed on status.
///
/// The `error` branch is deliberately generic; the underlying failure is only
/// carried in `Explanation::error`.
pub fn summarize(
    metric: MetricKey,
    status: Status,
    delta: &MetricDelta,
    top_drivers: &[DriverResult],
) -> String {
    let name = metric.display_name();
    match status {
        Status::NoData => format!(
            "No data is available for {name} yet. Connect a data source to start tracking changes."
        ),
        Status::Error => {
            format!("We couldn't analyze {name} right now. Please try again later.")
        }
        Status::Stable => format!(
            "{} remained stable over {WINDOW_PHRASE}.",
            capitalized(name)
        ),
        Status::Improving | Status::NeedsAttention => {
            let direction = if delta.absolute >= 0.0 {
                "increased"
            } else {
                "decreased"
            };
            let head = format!(
                "{} {direction} {:.1}% over {WINDOW_PHRASE}",
                capitalized(name),
                delta.percent.abs()
            );
            match top_drivers.first() {
                Some(top) => format!("{head}, primarily driven by {}.", driver_phrase(top)),
                None => format!("{head}."),
            }
        }
    }
}

/// [`summarize`] plus up to two secondary drivers.
pub fn summarize_detailed(
    metric: MetricKey,
    status: Status,
    delta: &MetricDelta,
    top_drivers: &[DriverResult],
) -> String {
    let base = summarize(metric, status, delta, top_drivers);
    if !matches!(status, Status::Improving | Status::NeedsAttention) {
        return base;
    }
    let secondary: Vec<String> = top_drivers
        .iter()
        .skip(1)
        .take(2)
        .map(driver_phrase)
        .collect();
    if secondary.is_empty() {
        return base;
    }
    format!(
        "{base} Other contributing factors include {}.",
        secondary.join(" and ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(driver_type: DriverType, label: &str, delta: f64) -> DriverResult {
        DriverResult {
            driver_type,
            label: label.to_string(),
            contribution_pct: 40.0,
            delta,
            value_before: 100.0,
            value_after: 100.0 + delta,
            details: String::new(),
        }
    }

    #[test]
    fn improving_summary_names_top_driver() {
        let delta = MetricDelta::between(1000.0, 1200.0);
        let drivers = [driver(DriverType::Channel, "Organic Search", 80.0)];
        assert_eq!(
            summarize(MetricKey::ActiveUsers, Status::Improving, &delta, &drivers),
            "Active users increased 20.0% over the last 7 days, primarily driven by growth in Organic Search traffic."
        );
    }

    #[test]
    fn declining_summary_uses_absolute_percent() {
        let delta = MetricDelta::between(200.0, 150.0);
        let drivers = [driver(DriverType::Device, "Mobile", -50.0)];
        assert_eq!(
            summarize(MetricKey::EventCount, Status::NeedsAttention, &delta, &drivers),
            "Event count decreased 25.0% over the last 7 days, primarily driven by changes in mobile users."
        );
    }

    #[test]
    fn summary_without_drivers_omits_clause() {
        let delta = MetricDelta::between(100.0, 150.0);
        assert_eq!(
            summarize(MetricKey::NewUsers, Status::Improving, &delta, &[]),
            "New users increased 50.0% over the last 7 days."
        );
    }

    #[test]
    fn stable_and_terminal_statuses() {
        let delta = MetricDelta::zero();
        assert_eq!(
            summarize(MetricKey::ActiveUsers, Status::Stable, &delta, &[]),
            "Active users remained stable over the last 7 days."
        );
        assert!(summarize(MetricKey::ActiveUsers, Status::NoData, &delta, &[])
            .contains("Connect a data source"));
        let error = summarize(MetricKey::ActiveUsers, Status::Error, &delta, &[]);
        assert!(error.starts_with("We couldn't analyze active users"));
    }

    #[test]
    fn driver_phrases_per_dimension() {
        assert_eq!(
            driver_phrase(&driver(DriverType::Channel, "Referral", -10.0)),
            "a decline in Referral traffic"
        );
        assert_eq!(
            driver_phrase(&driver(DriverType::Geography, "Germany", 10.0)),
            "changes in traffic from Germany"
        );
        assert_eq!(
            driver_phrase(&driver(DriverType::LandingPage, "/pricing", 10.0)),
            "your /pricing page"
        );
    }

    #[test]
    fn detailed_summary_appends_two_secondary_drivers() {
        let delta = MetricDelta::between(1000.0, 1200.0);
        let drivers = [
            driver(DriverType::Channel, "Organic Search", 80.0),
            driver(DriverType::Device, "Mobile", 60.0),
            driver(DriverType::LandingPage, "/blog", 40.0),
            driver(DriverType::Geography, "France", 20.0),
        ];
        let text = summarize_detailed(MetricKey::ActiveUsers, Status::Improving, &delta, &drivers);
        assert!(text.ends_with(
            "Other contributing factors include changes in mobile users and your /blog page."
        ));
        assert!(!text.contains("France"));
    }

    #[test]
    fn detailed_summary_matches_short_one_when_stable() {
        let delta = MetricDelta::zero();
        assert_eq!(
            summarize_detailed(MetricKey::ActiveUsers, Status::Stable, &delta, &[]),
            summarize(MetricKey::ActiveUsers, Status::Stable, &delta, &[])
        );
    }
}
