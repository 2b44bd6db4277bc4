pub mod config;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod store;
