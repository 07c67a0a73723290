//! Hub context - explicit ownership of store, registry, and configuration
//!
//! There are no process-wide singletons: the binary builds one `Hub`, hands
//! it to whatever serves clients, and stops it on shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use proxima_core::{unix_now, HubConfig, HubResult, Measurement};
use proxima_ingest::{IngestStats, Listener, ListenerHandle};
use proxima_model::VolumeModel;
use proxima_state::{PairStore, Snapshot};

use crate::broadcast::{run_broadcaster, SubscriberRegistry};
use crate::record::CsvRecorder;

/// Capacity of the accepted-measurement channel between ingest and apply
const MEASUREMENT_CHANNEL_CAPACITY: usize = 256;

/// Status surface: counters and gauges for operators
#[derive(Clone, Debug, Serialize)]
pub struct HubStatus {
    pub uptime_s: f64,
    pub measurements_received: u64,
    pub active_nodes: usize,
    pub active_pairs: usize,
    pub udp_packets_received: u64,
    pub udp_packets_invalid: u64,
    pub subscribers: usize,
}

/// The hub: resolved config plus every shared component
pub struct Hub {
    config: HubConfig,
    store: Arc<PairStore>,
    subscribers: Arc<SubscriberRegistry>,
    ingest_stats: Arc<IngestStats>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        let model = VolumeModel::new(config.volume.clone());
        let store = Arc::new(PairStore::new(
            model,
            config.system.stale_timeout_s,
            unix_now(),
        ));
        Hub {
            config,
            store,
            subscribers: Arc::new(SubscriberRegistry::new()),
            ingest_stats: Arc::new(IngestStats::default()),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<PairStore> {
        &self.store
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    /// Current snapshot, same shape the broadcast loop pushes
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot(unix_now())
    }

    /// Operator status: store gauges plus raw packet and subscriber counters
    pub fn status(&self) -> HubStatus {
        let gauges = self.store.gauges(unix_now());
        HubStatus {
            uptime_s: gauges.uptime_s,
            measurements_received: gauges.measurements_received,
            active_nodes: gauges.active_nodes,
            active_pairs: gauges.active_pairs,
            udp_packets_received: self.ingest_stats.packets_received(),
            udp_packets_invalid: self.ingest_stats.packets_invalid(),
            subscribers: self.subscribers.len(),
        }
    }

    /// Latest-state CSV export (the ingest-time history file holds the full
    /// record stream)
    pub fn export_csv(&self) -> String {
        self.store.export_csv()
    }

    /// Bind the socket and start the ingest, apply, and broadcast loops
    pub async fn start(&self) -> HubResult<HubHandle> {
        let listener = Listener::bind(
            &self.config.network,
            &self.config.advanced,
            self.config.system.udp_buffer_size,
            Arc::clone(&self.ingest_stats),
        )
        .await?;
        let local_addr = listener.local_addr();

        let recorder = if self.config.persistence.csv_export_enabled {
            Some(CsvRecorder::open(&self.config.persistence.csv_export_path)?)
        } else {
            None
        };

        let (tx, rx) = mpsc::channel(MEASUREMENT_CHANNEL_CAPACITY);
        let ingest = listener.spawn(tx);

        let apply = tokio::spawn(run_apply(rx, Arc::clone(&self.store), recorder));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let broadcast = tokio::spawn(run_broadcaster(
            Arc::clone(&self.store),
            Arc::clone(&self.subscribers),
            Duration::from_millis(self.config.broadcast.interval_ms),
            shutdown_rx,
        ));

        tracing::info!(%local_addr, "hub started");
        Ok(HubHandle {
            ingest,
            apply,
            broadcast,
            shutdown: shutdown_tx,
        })
    }
}

/// Apply loop: drain accepted measurements into the store and the history.
/// Ends when the ingest side closes the channel.
async fn run_apply(
    mut rx: mpsc::Receiver<Measurement>,
    store: Arc<PairStore>,
    mut recorder: Option<CsvRecorder>,
) {
    while let Some(measurement) = rx.recv().await {
        let volume = store.update(&measurement);
        if let Some(recorder) = recorder.as_mut() {
            recorder.append(&measurement, volume);
        }
    }
    tracing::info!("apply loop stopped");
}

/// Handle to the running hub tasks
pub struct HubHandle {
    ingest: ListenerHandle,
    apply: JoinHandle<()>,
    broadcast: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl HubHandle {
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.ingest.local_addr()
    }

    /// Orderly shutdown: stop ingest (releases the socket and closes the
    /// channel), let the apply loop drain, then stop broadcasting
    pub async fn stop(self) {
        self.ingest.stop().await;
        let _ = self.apply.await;
        let _ = self.shutdown.send(true);
        let _ = self.broadcast.await;
        tracing::info!("hub stopped");
    }
}
