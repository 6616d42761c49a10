// Session statistics server: UDP event ingest plus report export.

use std::sync::Arc;

use tracing::{error, info};

use gridstat_server::config::ServerConfig;
use gridstat_server::ingest;
use gridstat_server::records::RecordStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(
        bind = %config.bind_addr,
        port = config.port,
        output_dir = %config.output_dir.display(),
        "gridstat server starting"
    );

    let records = Arc::new(RecordStore::load(&config.data_dir));

    let ingest_config = config.clone();
    let ingest_records = records.clone();
    let ingest_task = tokio::spawn(async move {
        if let Err(err) = ingest::ingest_loop(ingest_config, ingest_records).await {
            error!(?err, "ingest loop terminated");
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
        _ = ingest_task => {
            error!("ingest task exited");
        }
    }
}
