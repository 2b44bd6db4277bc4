use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use trendlens_core::config::Config;
use trendlens_duckdb::DuckDbBackend;
use trendlens_server::state::AppState;

/// `trendlens health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$TRENDLENS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("TRENDLENS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trendlens=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db = DuckDbBackend::open(&cfg.db_path(), &cfg.duckdb_memory_limit)?;

    let state = Arc::new(AppState::new(db, cfg.clone()));
    let app = trendlens_server::app::build_app(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!(
        port = cfg.port,
        ingest_max_rows = cfg.ingest_max_rows,
        "Trendlens listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Trendlens stopped");
    Ok(())
}
