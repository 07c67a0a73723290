//! Staleness-filtered snapshots, status gauges, and CSV export rows

use std::fmt::Write as _;

use serde::Serialize;

use proxima_core::{round1, round2, NodeId};

use crate::store::PairStore;

/// Serialized view of one active pair (wire field names)
#[derive(Clone, Debug, Serialize)]
pub struct PairView {
    pub a: NodeId,
    pub b: NodeId,
    /// Distance, 2dp
    pub d: f64,
    /// Quality, 2dp
    pub q: f64,
    /// Volume, 2dp
    pub vol: f64,
    /// Seconds since last update, 1dp
    pub age: f64,
}

/// Volume-model constants echoed with every snapshot so viewers can scale
/// their rendering without a separate config fetch
#[derive(Clone, Debug, Serialize)]
pub struct ModelEcho {
    pub near_m: f64,
    pub far_m: f64,
    pub cutoff_m: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotStats {
    pub total_measurements: u64,
    pub active_pairs: usize,
    pub uptime_s: f64,
}

/// The broadcast payload: every fresh pair plus aggregate counters
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeId>,
    pub pairs: Vec<PairView>,
    pub config: ModelEcho,
    pub stats: SnapshotStats,
    pub timestamp: f64,
}

/// Point-in-time gauges for the status surface
#[derive(Clone, Debug, Serialize)]
pub struct StoreGauges {
    pub uptime_s: f64,
    pub measurements_received: u64,
    pub active_nodes: usize,
    pub active_pairs: usize,
}

/// Header for pair-state CSV export and the ingest-time history file
pub const CSV_HEADER: &str = "timestamp,node,peer,distance_m,quality,volume";

impl PairStore {
    /// Produce the broadcast snapshot as of `now`.
    ///
    /// Pairs whose age exceeds the stale timeout are filtered out, never
    /// deleted; the node list includes every node ever seen, sorted.
    pub fn snapshot(&self, now: f64) -> Snapshot {
        let timeout = self.stale_timeout();
        let (nodes, mut pairs, total) = self.read(|view| {
            let nodes: Vec<NodeId> = view.nodes().collect();
            let pairs: Vec<PairView> = view
                .pairs()
                .filter(|p| !p.is_stale(now, timeout))
                .map(|p| PairView {
                    a: p.key.a(),
                    b: p.key.b(),
                    d: round2(p.distance),
                    q: round2(p.quality),
                    vol: round2(p.volume),
                    age: round1(p.age(now)),
                })
                .collect();
            (nodes, pairs, view.measurements_received())
        });
        pairs.sort_by_key(|p| (p.a, p.b));

        let model = self.model().config();
        let active_pairs = pairs.len();
        Snapshot {
            nodes,
            pairs,
            config: ModelEcho {
                near_m: model.near_distance_m,
                far_m: model.far_distance_m,
                cutoff_m: model.cutoff_distance_m,
            },
            stats: SnapshotStats {
                total_measurements: total,
                active_pairs,
                uptime_s: round1(now - self.started_at()),
            },
            timestamp: now,
        }
    }

    /// Status gauges as of `now`
    pub fn gauges(&self, now: f64) -> StoreGauges {
        let timeout = self.stale_timeout();
        let (total, nodes, active) = self.read(|view| {
            (
                view.measurements_received(),
                view.node_count(),
                view.pairs().filter(|p| !p.is_stale(now, timeout)).count(),
            )
        });
        StoreGauges {
            uptime_s: round1(now - self.started_at()),
            measurements_received: total,
            active_nodes: nodes,
            active_pairs: active,
        }
    }

    /// Export every currently-known pair (stale included) as CSV rows.
    ///
    /// This is the latest-state view only; the true history is the file the
    /// ingest path appends to as measurements arrive.
    pub fn export_csv(&self) -> String {
        let mut rows = self.read(|view| {
            view.pairs()
                .map(|p| {
                    let ts = humantime::format_rfc3339_millis(
                        proxima_core::epoch_to_system_time(p.last_update),
                    );
                    (
                        p.key,
                        format!(
                            "{},{},{},{:.3},{:.3},{:.3}",
                            ts,
                            p.key.a(),
                            p.key.b(),
                            p.distance,
                            p.quality,
                            p.volume
                        ),
                    )
                })
                .collect::<Vec<_>>()
        });
        rows.sort_by_key(|(key, _)| *key);

        let mut out = String::with_capacity(CSV_HEADER.len() + rows.len() * 48 + 1);
        out.push_str(CSV_HEADER);
        out.push('\n');
        for (_, row) in rows {
            let _ = writeln!(out, "{}", row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_core::{Curve, Measurement, VolumeConfig};
    use proxima_model::VolumeModel;

    fn store() -> PairStore {
        let mut config = VolumeConfig::default();
        config.curve_type = Curve::Linear;
        config.apply_quality_weighting = false;
        PairStore::new(VolumeModel::new(config), 5.0, 100.0)
    }

    fn measurement(node: &str, peer: &str, distance: f64, at: f64) -> Measurement {
        Measurement {
            node: NodeId::parse(node).unwrap(),
            peer: NodeId::parse(peer).unwrap(),
            distance,
            quality: 0.87,
            timestamp: at,
            received_at: at,
        }
    }

    #[test]
    fn test_snapshot_filters_stale_pairs() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 100.0));
        store.update(&measurement("B", "C", 2.0, 104.0));

        let snapshot = store.snapshot(106.0);
        // A-B is 6s old (stale), B-C is 2s old
        assert_eq!(snapshot.pairs.len(), 1);
        assert_eq!(snapshot.pairs[0].a.as_char(), 'B');
        assert_eq!(snapshot.stats.active_pairs, 1);
        // stale pairs stay counted in totals and the node registry
        assert_eq!(snapshot.stats.total_measurements, 2);
        assert_eq!(snapshot.nodes.len(), 3);
    }

    #[test]
    fn test_stale_pair_reappears_after_update() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 100.0));
        assert_eq!(store.snapshot(110.0).pairs.len(), 0);

        store.update(&measurement("A", "B", 2.1, 110.0));
        let snapshot = store.snapshot(110.0);
        assert_eq!(snapshot.pairs.len(), 1);
        assert_eq!(snapshot.pairs[0].age, 0.0);
    }

    #[test]
    fn test_snapshot_age_at_timeout_still_fresh() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 100.0));
        assert_eq!(store.snapshot(105.0).pairs.len(), 1);
        assert_eq!(store.snapshot(105.1).pairs.len(), 0);
    }

    #[test]
    fn test_snapshot_rounding_and_echo() {
        let store = store();
        store.update(&measurement("A", "B", 2.756, 100.0));

        let snapshot = store.snapshot(101.25);
        let pair = &snapshot.pairs[0];
        assert_eq!(pair.d, 2.76);
        assert_eq!(pair.q, 0.87);
        assert_eq!(pair.age, 1.3); // 1.25 rounds half away from zero
        assert_eq!(snapshot.config.near_m, 1.5);
        assert_eq!(snapshot.config.cutoff_m, 5.0);
        assert_eq!(snapshot.stats.uptime_s, 1.3);
        assert_eq!(snapshot.timestamp, 101.25);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let store = store();
        store.update(&measurement("B", "A", 2.0, 100.0));

        let json = serde_json::to_value(store.snapshot(101.0)).unwrap();
        assert_eq!(json["nodes"], serde_json::json!(["A", "B"]));
        let pair = &json["pairs"][0];
        assert_eq!(pair["a"], "A");
        assert_eq!(pair["b"], "B");
        assert!(pair["vol"].is_number());
        assert_eq!(json["stats"]["active_pairs"], 1);
        assert!(json["config"]["far_m"].is_number());
    }

    #[test]
    fn test_gauges_count_active_only() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 100.0));
        store.update(&measurement("C", "D", 2.0, 108.0));

        let gauges = store.gauges(108.0);
        assert_eq!(gauges.measurements_received, 2);
        assert_eq!(gauges.active_nodes, 4);
        assert_eq!(gauges.active_pairs, 1);
        assert_eq!(gauges.uptime_s, 8.0);
    }

    #[test]
    fn test_export_includes_stale_pairs() {
        let store = store();
        store.update(&measurement("A", "B", 2.0, 100.0));
        store.update(&measurement("B", "C", 3.0, 108.0));

        let csv = store.export_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 3); // header + both pairs, staleness ignored
        assert!(lines[1].contains(",A,B,2.000,0.870,"));
    }
}
