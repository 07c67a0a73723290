//! Subscriber registry and periodic snapshot fan-out
//!
//! Subscribers are channel handles owned by the connection-acceptance layer
//! (whatever speaks the actual client protocol). Delivery is best-effort: a
//! subscriber whose channel is gone is dropped mid-broadcast and the push
//! continues to the rest.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use proxima_core::unix_now;
use proxima_state::PairStore;

/// Identity of one registered subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::UnboundedSender<String>,
}

/// Currently connected push-subscribers
#[derive(Default)]
pub struct SubscriberRegistry {
    inner: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        SubscriberRegistry::default()
    }

    /// Register a new subscriber; the returned receiver yields serialized
    /// snapshots until the subscriber is dropped or unsubscribed
    pub fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<String>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().push(Subscriber { id, tx });
        tracing::info!(id = id.0, total = self.len(), "subscriber connected");
        (id, rx)
    }

    /// Remove a subscriber explicitly (client closed its connection)
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.lock().retain(|s| s.id != id);
        tracing::info!(id = id.0, total = self.len(), "subscriber disconnected");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Push one payload to every subscriber; failed sends evict on the spot.
    /// Returns how many subscribers received the payload.
    pub fn broadcast(&self, payload: &str) -> usize {
        let mut delivered = 0;
        self.inner.lock().retain(|s| {
            if s.tx.send(payload.to_string()).is_ok() {
                delivered += 1;
                true
            } else {
                tracing::warn!(id = s.id.0, "subscriber send failed, dropping");
                false
            }
        });
        delivered
    }
}

/// Periodic broadcast loop: snapshot the store and fan out until shutdown
pub async fn run_broadcaster(
    store: Arc<PairStore>,
    registry: Arc<SubscriberRegistry>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval_ms = interval.as_millis() as u64;
    tracing::info!(interval_ms, "broadcast loop started");
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if registry.is_empty() {
                    continue;
                }
                let snapshot = store.snapshot(unix_now());
                match serde_json::to_string(&snapshot) {
                    Ok(payload) => {
                        registry.broadcast(&payload);
                    }
                    Err(e) => tracing::error!(error = %e, "snapshot serialization failed"),
                }
            }
        }
    }
    tracing::info!("broadcast loop stopped");
}
