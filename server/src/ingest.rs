// UDP ingest. A single loop drains framed events strictly in arrival
// order and applies them synchronously; the accumulator never needs a
// lock. Export runs on spawned tasks over immutable snapshots.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{error, info, warn};

use gridstat_core::events::EventProcessor;

use crate::codec;
use crate::config::ServerConfig;
use crate::export::Exporter;
use crate::records::RecordStore;

pub async fn ingest_loop(config: ServerConfig, records: Arc<RecordStore>) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let socket = UdpSocket::bind(addr).await?;
    info!(%addr, max_sectors = config.max_sectors, "event ingest started");

    let exporter = Arc::new(Exporter::new(&config, records));
    let mut processor = EventProcessor::new(config.max_sectors);
    let mut buf = [0u8; 2048];
    let mut last_inspect = Instant::now();

    loop {
        let (len, source) = socket.recv_from(&mut buf).await?;
        let Some(event) = codec::decode(&buf[..len]) else {
            continue;
        };

        match processor.apply(event) {
            Ok(Some(snapshot)) => {
                let exporter = exporter.clone();
                tokio::spawn(async move {
                    if let Err(err) = exporter.export_session(snapshot).await {
                        warn!(?err, "session export failed");
                    }
                });
            }
            Ok(None) => {}
            Err(err) => {
                // Configuration/protocol mismatch; the session was
                // abandoned, later sessions keep flowing.
                error!(%err, %source, "event processing stopped for this session");
            }
        }

        if last_inspect.elapsed() >= Duration::from_secs(1) {
            last_inspect = Instant::now();
            info!(
                phase = processor.phase().as_str(),
                participants = processor.registry().participant_count(),
                lap_counter = processor.registry().meta.lap_counter,
                "session inspect"
            );
        }
    }
}
