//! Duplicate suppression over a sliding time window
//!
//! The ranging units retransmit aggressively on lossy links, so the same
//! reading often arrives several times within a second. A signature
//! (reporter, peer, distance at 2dp) accepted once is suppressed until the
//! window elapses. Expired signatures are purged at most once per window
//! rather than on every packet, keeping the per-packet cost flat.

use std::collections::HashMap;

use proxima_core::Measurement;

/// Outcome of a dedup check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupVerdict {
    Accept,
    Duplicate,
}

/// Sliding-window duplicate filter keyed by measurement signature
#[derive(Debug)]
pub struct Deduper {
    enabled: bool,
    /// Window length in seconds
    window: f64,
    /// Signature -> last accepted time (epoch seconds)
    seen: HashMap<String, f64>,
    last_purge: f64,
}

impl Deduper {
    pub fn new(enabled: bool, window_ms: u64) -> Self {
        Deduper {
            enabled,
            window: window_ms as f64 / 1000.0,
            seen: HashMap::new(),
            last_purge: 0.0,
        }
    }

    /// Check one measurement; acceptance records its signature at `now`
    pub fn check(&mut self, m: &Measurement, now: f64) -> DedupVerdict {
        if !self.enabled {
            return DedupVerdict::Accept;
        }

        self.maybe_purge(now);

        let sig = m.signature();
        if let Some(&accepted_at) = self.seen.get(&sig) {
            if now - accepted_at < self.window {
                return DedupVerdict::Duplicate;
            }
        }
        self.seen.insert(sig, now);
        DedupVerdict::Accept
    }

    /// Signatures currently tracked (expired ones linger until the purge)
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    fn maybe_purge(&mut self, now: f64) {
        if now - self.last_purge < self.window {
            return;
        }
        let window = self.window;
        self.seen.retain(|_, &mut accepted_at| now - accepted_at < window);
        self.last_purge = now;
    }
}
