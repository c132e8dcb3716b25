//! Closed walks, stored normalized: lowest node first, then toward its
//! smaller ring neighbour.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::chain::Link;
use crate::graph::{Arena, RingId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    edge_set: BTreeSet<EdgeIndex>,
}

impl Cycle {
    /// Build a cycle from a closed walk. `edges[i]` must join `nodes[i]` and
    /// `nodes[(i + 1) % len]`.
    pub(crate) fn from_walk(mut nodes: Vec<NodeIndex>, mut edges: Vec<EdgeIndex>) -> Self {
        debug_assert_eq!(nodes.len(), edges.len());
        normalize(&mut nodes, &mut edges);
        let edge_set = edges.iter().copied().collect();
        Self {
            nodes,
            edges,
            edge_set,
        }
    }

    /// Interpret an edge set as a ring.
    ///
    /// Returns `None` unless the edges form exactly one simple closed ring:
    /// every touched node must have degree two and the edges must be
    /// connected.
    pub(crate) fn from_edges<A, B>(graph: &Arena<A, B>, edges: &BTreeSet<EdgeIndex>) -> Option<Self> {
        if edges.len() < 3 {
            return None;
        }
        let mut adjacency: BTreeMap<NodeIndex, Vec<(EdgeIndex, NodeIndex)>> = BTreeMap::new();
        for &edge in edges {
            let (a, b) = graph.edge_endpoints(edge)?;
            adjacency.entry(a).or_default().push((edge, b));
            adjacency.entry(b).or_default().push((edge, a));
        }
        if adjacency.values().any(|incident| incident.len() != 2) {
            return None;
        }

        let (&start, _) = adjacency.iter().next()?;
        let mut walk_nodes = Vec::with_capacity(edges.len());
        let mut walk_edges = Vec::with_capacity(edges.len());
        let mut current = start;
        let mut arrived_by: Option<EdgeIndex> = None;
        loop {
            let &(edge, next) = adjacency[&current]
                .iter()
                .find(|&&(edge, _)| Some(edge) != arrived_by)?;
            walk_nodes.push(current);
            walk_edges.push(edge);
            if next == start {
                break;
            }
            if walk_edges.len() > edges.len() {
                return None;
            }
            arrived_by = Some(edge);
            current = next;
        }
        // A shorter loop means the set splits into several disjoint rings.
        if walk_edges.len() != edges.len() {
            return None;
        }
        Some(Self::from_walk(walk_nodes, walk_edges))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn edge_set(&self) -> &BTreeSet<EdgeIndex> {
        &self.edge_set
    }

    pub fn contains_edge(&self, edge: EdgeIndex) -> bool {
        self.edge_set.contains(&edge)
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    /// The closed-chain view of `node`: the ring edge leaving it in walk
    /// order and the one arriving at it.
    pub fn links(&self, node: NodeIndex) -> Option<Link> {
        let pos = self.nodes.iter().position(|&n| n == node)?;
        let len = self.edges.len();
        Some(Link {
            forward: Some(self.edges[pos]),
            reverse: Some(self.edges[(pos + len - 1) % len]),
        })
    }

    pub fn shares_edge(&self, other: &Cycle) -> bool {
        !self.edge_set.is_disjoint(&other.edge_set)
    }

    pub fn symmetric_difference(&self, other: &Cycle) -> BTreeSet<EdgeIndex> {
        self.edge_set
            .symmetric_difference(&other.edge_set)
            .copied()
            .collect()
    }

    /// Number of this ring's edges that also belong to some other ring.
    pub(crate) fn fused_bonds<A, B>(&self, id: RingId, graph: &Arena<A, B>) -> usize {
        self.edges
            .iter()
            .filter(|&&edge| {
                graph
                    .edge_weight(edge)
                    .is_some_and(|weight| weight.rings().iter().any(|&r| r != id))
            })
            .count()
    }

    /// Whether this ring should be preferred over `other` as the primary
    /// ring of a shared edge: smaller rings first, then fewer fused edges,
    /// then the lower id.
    pub(crate) fn is_better_for_bonds<A, B>(
        &self,
        id: RingId,
        other: &Cycle,
        other_id: RingId,
        graph: &Arena<A, B>,
    ) -> bool {
        let mine = (self.len(), self.fused_bonds(id, graph), id);
        let theirs = (other.len(), other.fused_bonds(other_id, graph), other_id);
        mine < theirs
    }
}

fn normalize(nodes: &mut [NodeIndex], edges: &mut [EdgeIndex]) {
    let len = nodes.len();
    if len == 0 {
        return;
    }
    let min_pos = nodes
        .iter()
        .enumerate()
        .min_by_key(|&(_, node)| *node)
        .map_or(0, |(i, _)| i);
    nodes.rotate_left(min_pos);
    edges.rotate_left(min_pos);

    if len > 2 && nodes[1] > nodes[len - 1] {
        nodes[1..].reverse();
        edges.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn ring_arena(size: usize) -> (Arena<(), ()>, Vec<EdgeIndex>) {
        let mut graph = Arena::default();
        let nodes: Vec<_> = (0..size).map(|_| graph.add_node(())).collect();
        let edges = (0..size)
            .map(|i| graph.add_edge(nodes[i], nodes[(i + 1) % size], Edge::new(())))
            .collect();
        (graph, edges)
    }

    #[test]
    fn normalized_from_any_entry_point() {
        let (_, e) = ring_arena(5);
        let a = Cycle::from_walk(vec![n(2), n(3), n(4), n(0), n(1)], vec![e[2], e[3], e[4], e[0], e[1]]);
        let b = Cycle::from_walk(
            vec![n(3), n(2), n(1), n(0), n(4)],
            vec![e[2], e[1], e[0], e[4], e[3]],
        );
        assert_eq!(a, b);
        assert_eq!(a.nodes(), &[n(0), n(1), n(2), n(3), n(4)]);
        assert_eq!(a.edges(), &[e[0], e[1], e[2], e[3], e[4]]);
    }

    #[test]
    fn from_edges_accepts_simple_ring() {
        let (graph, e) = ring_arena(6);
        let set: BTreeSet<_> = e.iter().copied().collect();
        let cycle = Cycle::from_edges(&graph, &set).unwrap();
        assert_eq!(cycle.len(), 6);
        assert_eq!(cycle.nodes()[0], n(0));
        assert_eq!(cycle.nodes()[1], n(1));
    }

    #[test]
    fn from_edges_rejects_open_path() {
        let (graph, e) = ring_arena(6);
        let set: BTreeSet<_> = e[..5].iter().copied().collect();
        assert!(Cycle::from_edges(&graph, &set).is_none());
    }

    #[test]
    fn from_edges_rejects_two_disjoint_rings() {
        let mut graph: Arena<(), ()> = Arena::default();
        let nodes: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        let mut set = BTreeSet::new();
        for tri in [[0, 1, 2], [3, 4, 5]] {
            for i in 0..3 {
                set.insert(graph.add_edge(nodes[tri[i]], nodes[tri[(i + 1) % 3]], Edge::new(())));
            }
        }
        assert!(Cycle::from_edges(&graph, &set).is_none());
    }

    #[test]
    fn from_edges_rejects_figure_eight() {
        // Two triangles sharing node 0.
        let mut graph: Arena<(), ()> = Arena::default();
        let nodes: Vec<_> = (0..5).map(|_| graph.add_node(())).collect();
        let mut set = BTreeSet::new();
        for (a, b) in [(0, 1), (1, 2), (2, 0), (0, 3), (3, 4), (4, 0)] {
            set.insert(graph.add_edge(nodes[a], nodes[b], Edge::new(())));
        }
        assert!(Cycle::from_edges(&graph, &set).is_none());
    }

    #[test]
    fn links_close_the_chain() {
        let (graph, e) = ring_arena(4);
        let cycle = Cycle::from_edges(&graph, &e.iter().copied().collect()).unwrap();
        for &node in cycle.nodes() {
            let link = cycle.links(node).unwrap();
            assert!(link.forward.is_some() && link.reverse.is_some());
            assert_ne!(link.forward, link.reverse);
        }
        let first = cycle.links(n(0)).unwrap();
        assert_eq!(first.forward, Some(e[0]));
        assert_eq!(first.reverse, Some(e[3]));
        assert!(cycle.links(n(9)).is_none());
    }

    #[test]
    fn symmetric_difference_of_fused_pair() {
        // Square 0-1-2-3 with chord 0-2.
        let mut graph: Arena<(), ()> = Arena::default();
        let v: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let e01 = graph.add_edge(v[0], v[1], Edge::new(()));
        let e12 = graph.add_edge(v[1], v[2], Edge::new(()));
        let e23 = graph.add_edge(v[2], v[3], Edge::new(()));
        let e30 = graph.add_edge(v[3], v[0], Edge::new(()));
        let e02 = graph.add_edge(v[0], v[2], Edge::new(()));
        let left = Cycle::from_edges(&graph, &[e01, e12, e02].into_iter().collect()).unwrap();
        let right = Cycle::from_edges(&graph, &[e23, e30, e02].into_iter().collect()).unwrap();
        assert!(left.shares_edge(&right));
        let outer = Cycle::from_edges(&graph, &left.symmetric_difference(&right)).unwrap();
        assert_eq!(outer.len(), 4);
        assert!(!outer.contains_edge(e02));
    }

    #[test]
    fn better_for_bonds_prefers_smaller_then_less_fused() {
        let mut graph: Arena<(), ()> = Arena::default();
        let v: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let e01 = graph.add_edge(v[0], v[1], Edge::new(()));
        let e12 = graph.add_edge(v[1], v[2], Edge::new(()));
        let e23 = graph.add_edge(v[2], v[3], Edge::new(()));
        let e30 = graph.add_edge(v[3], v[0], Edge::new(()));
        let e02 = graph.add_edge(v[0], v[2], Edge::new(()));
        let tri_a = Cycle::from_edges(&graph, &[e01, e12, e02].into_iter().collect()).unwrap();
        let tri_b = Cycle::from_edges(&graph, &[e23, e30, e02].into_iter().collect()).unwrap();
        let square = Cycle::from_edges(&graph, &[e01, e12, e23, e30].into_iter().collect()).unwrap();
        let (a, b) = (RingId(0), RingId(1));
        for edge in tri_a.edges() {
            graph[*edge].join_ring(a);
        }
        for edge in tri_b.edges() {
            graph[*edge].join_ring(b);
        }
        assert_eq!(tri_a.fused_bonds(a, &graph), 1);
        assert!(tri_a.is_better_for_bonds(a, &square, RingId(2), &graph));
        assert!(!square.is_better_for_bonds(RingId(2), &tri_a, a, &graph));
        // Same size and fusion: the lower id wins.
        assert!(tri_a.is_better_for_bonds(a, &tri_b, b, &graph));
        assert!(!tri_b.is_better_for_bonds(b, &tri_a, a, &graph));
    }
}
