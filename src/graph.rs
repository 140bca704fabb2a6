//! The graph model: externally owned, directed, capacitated edges.
//!
//! `treecast` does not own a graph type of its own — callers hand it a
//! slice of externally owned [`QualifiedEdge`] references, the same
//! arrangement `petgraph`'s own algorithms use via the `IntoEdges` /
//! `IntoEdgeReferences` visitor traits rather than requiring a concrete
//! `Graph<N, E>`.

use crate::capacity::BidiCapacity;

/// A single directed edge with bidirectional capacity and a scalar cost.
///
/// `V` is whatever vertex identifier the caller already uses (an index, a
/// name, a port id via [`crate::planner::plan_with_ports`]); `treecast`
/// only requires `V: Copy + Eq + Hash` at the point it actually needs to key
/// a map by vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualifiedEdge<V> {
    start: V,
    finish: V,
    capacity: BidiCapacity,
    cost: f64,
}

impl<V: Copy> QualifiedEdge<V> {
    /// Construct a new qualified edge.
    pub fn new(start: V, finish: V, capacity: BidiCapacity, cost: f64) -> Self {
        Self {
            start,
            finish,
            capacity,
            cost,
        }
    }

    /// The vertex traffic enters from.
    pub fn start(&self) -> V {
        self.start
    }

    /// The vertex traffic exits to.
    pub fn finish(&self) -> V {
        self.finish
    }

    /// The edge's bidirectional capacity.
    pub fn capacity(&self) -> BidiCapacity {
        self.capacity
    }

    /// The edge's scalar cost, used by callers to score candidate trees.
    pub fn cost(&self) -> f64 {
        self.cost
    }
}
