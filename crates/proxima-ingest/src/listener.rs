//! UDP listener - owns the datagram socket and runs the receive loop
//!
//! Each datagram goes decode -> validate -> dedup; survivors are handed to
//! the hub over an mpsc channel. A socket error is logged and the loop backs
//! off briefly; a bad packet never terminates it. Stop is explicit: the
//! handle flips a watch channel and awaits the task, which releases the
//! socket on exit.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use proxima_core::{unix_now, AdvancedConfig, HubError, HubResult, Measurement, NetworkConfig};

use crate::dedup::{DedupVerdict, Deduper};
use crate::validate::validate_packet;

/// Backoff after a socket-level receive error
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Raw packet counters, shared with the status surface
#[derive(Debug, Default)]
pub struct IngestStats {
    packets_received: AtomicU64,
    packets_invalid: AtomicU64,
}

impl IngestStats {
    pub fn packets_received(&self) -> u64 {
        self.packets_received.load(Ordering::Relaxed)
    }

    pub fn packets_invalid(&self) -> u64 {
        self.packets_invalid.load(Ordering::Relaxed)
    }

    fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_invalid(&self) {
        self.packets_invalid.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bound UDP listener, not yet receiving
pub struct Listener {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    stats: Arc<IngestStats>,
    deduper: Deduper,
    strict: bool,
    buffer_size: usize,
}

impl Listener {
    /// Bind the measurement socket
    pub async fn bind(
        network: &NetworkConfig,
        advanced: &AdvancedConfig,
        buffer_size: usize,
        stats: Arc<IngestStats>,
    ) -> HubResult<Self> {
        let socket = UdpSocket::bind(network.udp_addr())
            .await
            .map_err(|e| HubError::Transport(e.to_string()))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| HubError::Transport(e.to_string()))?;

        tracing::info!(%local_addr, "UDP listener bound");

        Ok(Listener {
            socket: Arc::new(socket),
            local_addr,
            stats,
            deduper: Deduper::new(advanced.deduplicate_packets, advanced.dedup_window_ms),
            strict: advanced.strict_validation,
            buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the receive loop; accepted measurements flow out on `tx`
    pub fn spawn(self, tx: mpsc::Sender<Measurement>) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let local_addr = self.local_addr;
        let task = tokio::spawn(self.run(tx, shutdown_rx));
        ListenerHandle {
            shutdown: shutdown_tx,
            task,
            local_addr,
        }
    }

    async fn run(mut self, tx: mpsc::Sender<Measurement>, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                recv = self.socket.recv_from(&mut buf) => match recv {
                    Ok((len, addr)) => {
                        if self.handle_packet(&buf[..len], addr, &tx).await.is_err() {
                            // hub side hung up; nothing left to feed
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "UDP receive error, backing off");
                        tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    }
                },
            }
        }
        tracing::info!(local_addr = %self.local_addr, "UDP listener stopped");
    }

    async fn handle_packet(
        &mut self,
        payload: &[u8],
        addr: SocketAddr,
        tx: &mpsc::Sender<Measurement>,
    ) -> Result<(), ()> {
        self.stats.record_received();
        let now = unix_now();

        let measurement = match validate_packet(payload, now, self.strict) {
            Ok(m) => m,
            Err(reason) => {
                self.stats.record_invalid();
                tracing::warn!(%addr, %reason, "invalid packet");
                return Ok(());
            }
        };

        // duplicates are suppressed silently, not counted invalid
        if self.deduper.check(&measurement, now) == DedupVerdict::Duplicate {
            tracing::debug!(%addr, sig = %measurement.signature(), "duplicate packet ignored");
            return Ok(());
        }

        tracing::debug!(
            %addr,
            node = %measurement.node,
            peer = %measurement.peer,
            distance = measurement.distance,
            quality = measurement.quality,
            "measurement accepted"
        );
        tx.send(measurement).await.map_err(|_| ())
    }
}

/// Handle to a running listener; stopping releases the socket
pub struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal the loop to exit and wait for the socket to be released
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
