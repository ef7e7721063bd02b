#![forbid(unsafe_code)]

use log::{info, warn};
use staffdesk_core::db::open_db;
use staffdesk_core::{init_logging, QueryStore};
use staffdesk_server::{build_router, AppState, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level, &config.log_dir)?;

    // Apply migrations before accepting traffic.
    drop(open_db(&config.db_path)?);

    let state = Arc::new(AppState::new(
        config.db_path.clone(),
        QueryStore::new(config.query_store_path.clone()),
    ));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "event=server_start module=server status=ok bind={} db_path={} query_store={}",
        config.bind,
        config.db_path.display(),
        config.query_store_path.display()
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=server status=error error={err}");
    }
}
