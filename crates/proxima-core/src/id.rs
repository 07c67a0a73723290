//! Identity types for the proximity hub
//!
//! Node identifiers are a single character. The ranging units ship with
//! one-letter labels burned into firmware; the hub rejects anything longer
//! so a mislabeled unit is caught at the edge rather than polluting the
//! pair map. Widening the id space means changing `NodeId::parse` only.

use std::fmt;

use serde::Serialize;

use crate::{HubError, HubResult};

/// Identity of one ranging node (single-character label)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(char);

impl NodeId {
    /// Parse an id from a wire string; must be exactly one character
    pub fn parse(s: &str) -> HubResult<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(NodeId(c)),
            _ => Err(HubError::InvalidNodeId(s.to_string())),
        }
    }

    #[inline]
    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical identity of an undirected node pair
///
/// INVARIANT: always stored as `(min, max)` so that a report from A about B
/// and a report from B about A land on the same entry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PairKey {
    a: NodeId,
    b: NodeId,
}

impl PairKey {
    /// Build the canonical key for two nodes, in either order
    pub fn new(x: NodeId, y: NodeId) -> Self {
        if x <= y {
            PairKey { a: x, b: y }
        } else {
            PairKey { a: y, b: x }
        }
    }

    #[inline]
    pub fn a(self) -> NodeId {
        self.a
    }

    #[inline]
    pub fn b(self) -> NodeId {
        self.b
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}
