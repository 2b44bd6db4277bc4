use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("metric_key must be one of: activeUsers, eventCount, newUsers, avgTimeToLeadSubmit (got {0:?})")]
    UnknownMetricKey(String),

    #[error("site_id must be 1-64 characters of letters, digits, '_' or '-'")]
    InvalidSiteId,

    #[error("row for {date}: {reason}")]
    InvalidRow { date: NaiveDate, reason: String },
}
