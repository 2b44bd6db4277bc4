pub mod daily_metrics;
pub mod explanations;
pub mod health;
