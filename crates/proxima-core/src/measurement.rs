//! Measurement record - one validated distance report
//!
//! Measurements are ephemeral: created per datagram, folded into the pair
//! store immediately, and optionally appended to the CSV history. Nothing
//! retains them afterwards.

use crate::{NodeId, PairKey};

/// One validated distance/quality reading from a ranging node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Reporting node
    pub node: NodeId,
    /// Peer the distance was measured against
    pub peer: NodeId,
    /// Distance in meters
    pub distance: f64,
    /// Link quality, 0.0-1.0
    pub quality: f64,
    /// Reporter-supplied timestamp (epoch seconds); arrival time when absent
    pub timestamp: f64,
    /// Server arrival time (epoch seconds)
    pub received_at: f64,
}

impl Measurement {
    /// Canonical key of the pair this measurement belongs to
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.node, self.peer)
    }

    /// Dedup signature: reporter, peer, and distance at 2dp precision.
    /// Direction matters here (A->B and B->A are distinct reports).
    pub fn signature(&self) -> String {
        format!("{}-{}-{:.2}", self.node, self.peer, self.distance)
    }
}
