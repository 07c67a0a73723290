//! Pair store - latest state per node pair plus the node registry

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;

use proxima_core::{Measurement, NodeId, PairKey};
use proxima_model::VolumeModel;

/// Latest known state of one node pair
#[derive(Clone, Copy, Debug)]
pub struct PairState {
    pub key: PairKey,
    pub distance: f64,
    pub quality: f64,
    pub volume: f64,
    /// Server time of last update (epoch seconds)
    pub last_update: f64,
}

impl PairState {
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_update
    }

    /// Stale once age exceeds the timeout; equality is still fresh
    pub fn is_stale(&self, now: f64, timeout: f64) -> bool {
        self.age(now) > timeout
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Pair states keyed by canonical pair
    pairs: HashMap<PairKey, PairState>,
    /// Every node ever seen as reporter or peer; grows monotonically
    nodes: BTreeSet<NodeId>,
    /// Total measurements applied
    measurements_received: u64,
}

/// Shared store of the live proximity graph
///
/// `update` and the snapshot reads each take the lock for one indivisible
/// step; the ingest path is the only writer, broadcast and status queries
/// are the readers.
pub struct PairStore {
    inner: Mutex<StoreInner>,
    model: VolumeModel,
    stale_timeout: f64,
    started_at: f64,
}

impl PairStore {
    pub fn new(model: VolumeModel, stale_timeout: f64, started_at: f64) -> Self {
        PairStore {
            inner: Mutex::new(StoreInner::default()),
            model,
            stale_timeout,
            started_at,
        }
    }

    pub fn model(&self) -> &VolumeModel {
        &self.model
    }

    pub fn stale_timeout(&self) -> f64 {
        self.stale_timeout
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// Apply one measurement: compute the volume, replace the pair entry
    /// (last write wins), register both nodes. Returns the derived volume
    /// so the caller can record it without re-deriving.
    pub fn update(&self, m: &Measurement) -> f64 {
        let key = m.pair_key();
        let volume = self.model.volume(m.distance, m.quality);

        let mut inner = self.inner.lock();
        inner.pairs.insert(
            key,
            PairState {
                key,
                distance: m.distance,
                quality: m.quality,
                volume,
                last_update: m.received_at,
            },
        );
        inner.nodes.insert(m.node);
        inner.nodes.insert(m.peer);
        inner.measurements_received += 1;

        tracing::trace!(pair = %key, distance = m.distance, volume, "pair updated");
        volume
    }

    /// Latest state for one pair, stale or not
    pub fn pair(&self, key: PairKey) -> Option<PairState> {
        self.inner.lock().pairs.get(&key).copied()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&StoreReadView<'_>) -> R) -> R {
        let inner = self.inner.lock();
        f(&StoreReadView { inner: &inner })
    }
}

/// Borrowed read access for snapshot construction, held under the lock
pub(crate) struct StoreReadView<'a> {
    inner: &'a StoreInner,
}

impl StoreReadView<'_> {
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inner.nodes.iter().copied()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairState> {
        self.inner.pairs.values()
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn measurements_received(&self) -> u64 {
        self.inner.measurements_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_core::VolumeConfig;

    fn store() -> PairStore {
        let mut config = VolumeConfig::default();
        config.curve_type = proxima_core::Curve::Linear;
        config.apply_quality_weighting = false;
        PairStore::new(VolumeModel::new(config), 5.0, 0.0)
    }

    fn measurement(node: &str, peer: &str, distance: f64, at: f64) -> Measurement {
        Measurement {
            node: NodeId::parse(node).unwrap(),
            peer: NodeId::parse(peer).unwrap(),
            distance,
            quality: 0.9,
            timestamp: at,
            received_at: at,
        }
    }

    #[test]
    fn test_update_is_last_write_wins() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 1.0));
        store.update(&measurement("A", "B", 3.0, 2.0));

        let key = PairKey::new(NodeId::parse("A").unwrap(), NodeId::parse("B").unwrap());
        let pair = store.pair(key).unwrap();
        assert_eq!(pair.distance, 3.0);
        assert_eq!(pair.last_update, 2.0);
    }

    #[test]
    fn test_update_symmetric_directions_collapse() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 1.0));
        store.update(&measurement("B", "A", 2.5, 2.0));

        store.read(|view| {
            assert_eq!(view.pairs().count(), 1);
            assert_eq!(view.measurements_received(), 2);
        });
    }

    #[test]
    fn test_nodes_registered_from_both_sides() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 1.0));
        store.update(&measurement("C", "A", 1.0, 1.0));

        store.read(|view| {
            let nodes: Vec<char> = view.nodes().map(|n| n.as_char()).collect();
            assert_eq!(nodes, vec!['A', 'B', 'C']); // BTreeSet keeps them sorted
        });
    }

    #[test]
    fn test_staleness_boundary() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 10.0));

        let key = PairKey::new(NodeId::parse("A").unwrap(), NodeId::parse("B").unwrap());
        let pair = store.pair(key).unwrap();
        assert!(!pair.is_stale(15.0, 5.0)); // age == timeout: still fresh
        assert!(pair.is_stale(15.1, 5.0));
    }

    #[test]
    fn test_update_returns_model_volume() {
        let store = store();
        // 2.75m is the midpoint of the default 1.5..4.0 band
        let volume = store.update(&measurement("A", "B", 2.75, 1.0));
        assert_eq!(volume, 0.5);
    }
}
