use std::sync::Arc;

use trendlens_core::{explain::Explainer, store::MetricsStore};
use trendlens_duckdb::DuckDbBackend;

use crate::config::Config;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The DuckDB backend, used directly by the ingest route and `/health`.
    pub db: Arc<DuckDbBackend>,

    /// Attribution engine reading from the same backend through
    /// [`MetricsStore`].
    pub explainer: Explainer,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let store: Arc<dyn MetricsStore> = db.clone();
        Self {
            db,
            explainer: Explainer::new(store),
            config: Arc::new(config),
        }
    }
}
