use super::window::WINDOW_DAYS;
use super::{Confidence, ConfidenceLevel, DriverResult};

const COMPLETENESS_WEIGHT: f64 = 40.0;
const EXPLANATORY_WEIGHT: f64 = 30.0;

/// Heuristic trust score for an attribution.
///
/// Three capped signals: how many of the 7 days each window covers (40 points), how
/// much of the change the top drivers account for (30 points), and how large
/// the change is (30 points, stepped). Small moves are hard to attribute, so
/// they cap the score even when the drivers look good.
pub fn score(
    current_days: usize,
    previous_days: usize,
    top_drivers: &[DriverResult],
    percent_change: f64,
) -> Confidence {
    let days = WINDOW_DAYS as f64;
    let coverage = (current_days as f64 / days).min(1.0) + (previous_days as f64 / days).min(1.0);
    let completeness = coverage / 2.0 * COMPLETENESS_WEIGHT;

    let explained: f64 = top_drivers
        .iter()
        .map(|d| d.contribution_pct.abs())
        .filter(|pct| pct.is_finite())
        .sum();
    let explanatory = explained.min(100.0) / 100.0 * EXPLANATORY_WEIGHT;

    let total = completeness + explanatory + magnitude_points(percent_change);
    let score = if total.is_finite() {
        total.round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    Confidence {
        level: level_for(score),
        score,
    }
}

fn magnitude_points(percent_change: f64) -> f64 {
    let magnitude = percent_change.abs();
    if magnitude >= 20.0 {
        30.0
    } else if magnitude >= 10.0 {
        20.0
    } else if magnitude >= 5.0 {
        10.0
    } else {
        5.0
    }
}

pub fn level_for(score: u8) -> ConfidenceLevel {
    match score {
        70..=u8::MAX => ConfidenceLevel::High,
        45..=69 => ConfidenceLevel::Med,
        _ => ConfidenceLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::DriverType;

    fn driver(pct: f64) -> DriverResult {
        DriverResult {
            driver_type: DriverType::Channel,
            label: "Organic Search".to_string(),
            contribution_pct: pct,
            delta: pct,
            value_before: 0.0,
            value_after: pct,
            details: String::new(),
        }
    }

    #[test]
    fn full_windows_strong_drivers_large_change_is_high() {
        let c = score(7, 7, &[driver(60.0), driver(-50.0)], 25.0);
        assert_eq!(c.score, 100);
        assert_eq!(c.level, ConfidenceLevel::High);
    }

    #[test]
    fn extra_days_do_not_exceed_completeness_budget() {
        let c = score(9, 8, &[], 2.0);
        // 40 completeness + 0 explanatory + 5 magnitude.
        assert_eq!(c.score, 45);
        assert_eq!(c.level, ConfidenceLevel::Med);
    }

    #[test]
    fn sparse_data_small_change_is_low() {
        let c = score(2, 0, &[driver(10.0)], 3.0);
        // 2/7 / 2 * 40 = 5.71, 10% of 30 = 3, 5 magnitude.
        assert_eq!(c.score, 14);
        assert_eq!(c.level, ConfidenceLevel::Low);
    }

    #[test]
    fn magnitude_is_stepped() {
        assert_eq!(magnitude_points(-20.0), 30.0);
        assert_eq!(magnitude_points(19.9), 20.0);
        assert_eq!(magnitude_points(10.0), 20.0);
        assert_eq!(magnitude_points(-5.0), 10.0);
        assert_eq!(magnitude_points(4.9), 5.0);
    }

    #[test]
    fn level_mapping_is_exact() {
        assert_eq!(level_for(100), ConfidenceLevel::High);
        assert_eq!(level_for(70), ConfidenceLevel::High);
        assert_eq!(level_for(69), ConfidenceLevel::Med);
        assert_eq!(level_for(45), ConfidenceLevel::Med);
        assert_eq!(level_for(44), ConfidenceLevel::Low);
        assert_eq!(level_for(0), ConfidenceLevel::Low);
    }

    #[test]
    fn non_finite_input_stays_in_bounds() {
        let c = score(7, 7, &[driver(f64::NAN)], f64::INFINITY);
        assert!(c.score <= 100);
    }
}
