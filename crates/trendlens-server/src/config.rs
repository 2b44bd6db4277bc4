/// Re-export `Config` from `trendlens-core` for use within this crate.
///
/// Environment parsing lives in core so integration tests can build a
/// `Config` without pulling in the server.
pub use trendlens_core::config::Config;
