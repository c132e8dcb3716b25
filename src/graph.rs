use std::collections::BTreeSet;
use std::fmt;

use petgraph::stable_graph::StableUnGraph;

/// Identifier of a published ring.
///
/// Ring ids are handed out by a [`GraphManager`](crate::GraphManager) in
/// increasing order and are only meaningful for the manager that issued
/// them. A full [`update_cycles`](crate::GraphManager::update_cycles)
/// restarts numbering from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RingId(pub(crate) u32);

impl RingId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring#{}", self.0)
    }
}

/// Edge weight stored in the arena.
///
/// Wraps the caller's payload together with the set of rings the edge
/// currently belongs to. The ring set is a back-reference only: the
/// manager owns the rings, and keeps this set in sync with them.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<B> {
    pub data: B,
    rings: BTreeSet<RingId>,
}

impl<B> Edge<B> {
    pub(crate) fn new(data: B) -> Self {
        Self {
            data,
            rings: BTreeSet::new(),
        }
    }

    pub fn rings(&self) -> &BTreeSet<RingId> {
        &self.rings
    }

    pub fn is_cyclic(&self) -> bool {
        !self.rings.is_empty()
    }

    pub(crate) fn join_ring(&mut self, id: RingId) {
        self.rings.insert(id);
    }

    pub(crate) fn leave_ring(&mut self, id: RingId) {
        self.rings.remove(&id);
    }

    pub(crate) fn clear_rings(&mut self) {
        self.rings.clear();
    }
}

/// Cyclic status of a connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// No nodes at all.
    Empty,
    /// A tree: no edge lies on a ring.
    Acyclic,
    /// At least one fundamental ring.
    Cyclic,
}

/// The arena type shared by the search code and the manager.
pub(crate) type Arena<A, B> = StableUnGraph<A, Edge<B>>;
