//! Rule-based remediation advice.
//!
//! Channel and device labels are free text, so templates are picked by
//! substring in a fixed order. Order matters: "organic" must win over
//! "search" for "Organic Search".

use super::drivers::DriverBreakdown;
use super::{DriverResult, Priority, Recommendation, Status, MAX_RECOMMENDATIONS};

struct Rule {
    pattern: &'static str,
    title: &'static str,
    action: &'static str,
}

const DECLINING_CHANNEL_RULES: &[Rule] = &[
    Rule {
        pattern: "organic",
        title: "Recover organic search visibility",
        action: "Audit rankings and indexation for the pages that lost {label} traffic, and check Search Console for coverage errors or recent algorithm updates.",
    },
    Rule {
        pattern: "search",
        title: "Review search performance",
        action: "Check keyword rankings, bids and ad copy behind {label} traffic for recent changes.",
    },
    Rule {
        pattern: "direct",
        title: "Re-engage returning visitors",
        action: "{label} traffic fell. Review brand campaigns, email cadence and any broken bookmarked URLs.",
    },
    Rule {
        pattern: "referral",
        title: "Check referral partners",
        action: "Verify that backlinks and partner placements sending {label} traffic are still live.",
    },
    Rule {
        pattern: "social",
        title: "Refresh social distribution",
        action: "Posting frequency or reach on {label} may have dropped. Review recent posts and engagement.",
    },
];

const DECLINING_DEVICE_RULES: &[Rule] = &[
    Rule {
        pattern: "mobile",
        title: "Audit the mobile experience",
        action: "{label} users declined. Check Core Web Vitals, layout shifts and form usability on small screens.",
    },
    Rule {
        pattern: "desktop",
        title: "Review the desktop experience",
        action: "{label} users declined. Check for broken layouts, slow pages or browser-specific errors on desktop.",
    },
];

fn render(template: &str, label: &str) -> String {
    template.replace("{label}", label)
}

fn from_rules(rules: &[Rule], driver: &DriverResult, fallback_noun: &str) -> Recommendation {
    let needle = driver.label.to_lowercase();
    match rules.iter().find(|rule| needle.contains(rule.pattern)) {
        Some(rule) => Recommendation {
            priority: Priority::High,
            title: rule.title.to_string(),
            action: render(rule.action, &driver.label),
        },
        None => Recommendation {
            priority: Priority::High,
            title: format!("Analyze {} {fallback_noun}", driver.label),
            action: format!(
                "Review what changed for {} {fallback_noun} over the last 7 days.",
                driver.label
            ),
        },
    }
}

fn page_list(pages: &[&DriverResult]) -> String {
    pages
        .iter()
        .take(3)
        .map(|p| p.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Up to three recommendations for a finished analysis.
pub fn recommend(status: Status, breakdown: &DriverBreakdown) -> Vec<Recommendation> {
    match status {
        // The engine's `failed()` builds error explanations without calling
        // this; keep the two in step if error advice ever changes.
        Status::NoData | Status::Error => {
            return vec![Recommendation {
                priority: Priority::High,
                title: "Connect a data source".to_string(),
                action: "Connect Google Analytics or Search Console so daily metrics can be analyzed.".to_string(),
            }];
        }
        Status::Stable => {
            return vec![Recommendation {
                priority: Priority::Low,
                title: "Continue monitoring".to_string(),
                action: "No significant change this week. Keep tracking and revisit if the trend shifts.".to_string(),
            }];
        }
        Status::NeedsAttention | Status::Improving => {}
    }

    let mut out = Vec::new();

    if status == Status::NeedsAttention {
        let declining_pages: Vec<&DriverResult> = breakdown
            .landing_page
            .iter()
            .filter(|d| d.delta < 0.0)
            .collect();
        if !declining_pages.is_empty() {
            out.push(Recommendation {
                priority: Priority::High,
                title: "Investigate declining pages".to_string(),
                action: format!(
                    "Review content freshness, rankings and technical health for: {}.",
                    page_list(&declining_pages)
                ),
            });
        }
        if let Some(channel) = breakdown.channel.iter().find(|d| d.delta < 0.0) {
            out.push(from_rules(DECLINING_CHANNEL_RULES, channel, "traffic"));
        }
        if let Some(device) = breakdown.device.iter().find(|d| d.delta < 0.0) {
            out.push(from_rules(DECLINING_DEVICE_RULES, device, "users"));
        }
    } else {
        if let Some(channel) = breakdown.channel.iter().find(|d| d.delta > 0.0) {
            out.push(Recommendation {
                priority: Priority::Medium,
                title: format!("Scale {}", channel.label),
                action: format!(
                    "{} is driving growth. Increase investment there and repeat the tactics that worked.",
                    channel.label
                ),
            });
        }
        let growing_pages: Vec<&DriverResult> = breakdown
            .landing_page
            .iter()
            .filter(|d| d.delta > 0.0)
            .collect();
        if !growing_pages.is_empty() {
            out.push(Recommendation {
                priority: Priority::Medium,
                title: "Replicate top performers".to_string(),
                action: format!(
                    "Use the structure and messaging of {} as a template for other pages.",
                    page_list(&growing_pages)
                ),
            });
        }
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}
