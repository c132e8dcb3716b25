//! Open walks and the ring searches built on them.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::cycle::Cycle;
use crate::graph::Arena;

/// The two walk edges recorded for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    pub forward: Option<EdgeIndex>,
    pub reverse: Option<EdgeIndex>,
}

/// An open walk through the graph.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    links: HashMap<NodeIndex, Link>,
}

struct Frame {
    node: NodeIndex,
    arrival: Option<EdgeIndex>,
    // Reversed so that `pop` yields ascending edge indices.
    pending: Vec<(EdgeIndex, NodeIndex)>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.links.contains_key(&node)
    }

    pub fn link(&self, node: NodeIndex) -> Option<Link> {
        self.links.get(&node).copied()
    }

    fn start(&mut self, node: NodeIndex) {
        self.links.insert(node, Link::default());
    }

    fn extend(&mut self, from: NodeIndex, edge: EdgeIndex, to: NodeIndex) {
        if let Some(link) = self.links.get_mut(&from) {
            link.forward = Some(edge);
        }
        self.links.insert(
            to,
            Link {
                forward: None,
                reverse: Some(edge),
            },
        );
    }

    /// Drop `node` from the end of the walk; `previous` becomes the new end.
    fn retreat(&mut self, node: NodeIndex, previous: Option<NodeIndex>) {
        self.links.remove(&node);
        if let Some(link) = previous.and_then(|p| self.links.get_mut(&p)) {
            link.forward = None;
        }
    }

    /// Materialize the ring formed by the walk from `from` to `to` plus the
    /// edge `closing` that joins `to` back to `from`.
    fn close<A, B>(
        &self,
        graph: &Arena<A, B>,
        from: NodeIndex,
        to: NodeIndex,
        closing: EdgeIndex,
    ) -> Option<Cycle> {
        let mut nodes = vec![from];
        let mut edges = Vec::new();
        let mut current = from;
        while current != to {
            let edge = self.links.get(&current)?.forward?;
            let next = opposite(graph, edge, current)?;
            edges.push(edge);
            nodes.push(next);
            current = next;
            if nodes.len() > self.links.len() {
                return None;
            }
        }
        edges.push(closing);
        Some(Cycle::from_walk(nodes, edges))
    }

    /// Find the ring closed by the freshly inserted `edge`.
    ///
    /// The walk is seeded with `edge` itself and then searches breadth-first
    /// from its far endpoint back to its near one without crossing `edge`
    /// again, so the ring found is the smallest one through `edge`. Returns
    /// `None` when the endpoints were not connected before the insertion.
    pub fn incremental<A, B>(graph: &Arena<A, B>, edge: EdgeIndex) -> Option<Cycle> {
        let (a, b) = graph.edge_endpoints(edge)?;

        let mut parent: HashMap<NodeIndex, (EdgeIndex, NodeIndex)> = HashMap::new();
        let mut seen = HashSet::from([b]);
        let mut queue = VecDeque::from([b]);
        'search: while let Some(current) = queue.pop_front() {
            for (e, next) in incident(graph, current) {
                if e == edge || !seen.insert(next) {
                    continue;
                }
                parent.insert(next, (e, current));
                if next == a {
                    break 'search;
                }
                queue.push_back(next);
            }
        }
        let &(closing, last) = parent.get(&a)?;

        // Path from `b` to the node just before `a`.
        let mut path = vec![last];
        let mut cursor = last;
        while cursor != b {
            let &(_, prev) = parent.get(&cursor)?;
            path.push(prev);
            cursor = prev;
        }
        path.reverse();

        let mut chain = Chain::new();
        chain.start(a);
        chain.extend(a, edge, b);
        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let &(e, _) = parent.get(&to)?;
            chain.extend(from, e, to);
        }
        chain.close(graph, a, last, closing)
    }

    /// Walk the component of `seed` depth-first and return every ring that
    /// closes onto the walk, in discovery order.
    ///
    /// Nodes reached are added to `visited`; a seed that is already in
    /// `visited` yields nothing. Sharing `visited` across calls lets a
    /// caller reseed on whatever the previous walks did not reach.
    pub fn full<A, B>(
        graph: &Arena<A, B>,
        seed: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
    ) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        if !graph.contains_node(seed) || !visited.insert(seed) {
            return cycles;
        }

        let mut chain = Chain::new();
        chain.start(seed);
        let mut stack = vec![Frame::new(graph, seed, None)];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let node = frame.node;
            let arrival = frame.arrival;
            match frame.pending.pop() {
                Some((edge, next)) => {
                    if Some(edge) == arrival {
                        continue;
                    }
                    if chain.contains(next) {
                        if let Some(cycle) = chain.close(graph, next, node, edge) {
                            cycles.push(cycle);
                        }
                    } else if visited.insert(next) {
                        chain.extend(node, edge, next);
                        stack.push(Frame::new(graph, next, Some(edge)));
                    }
                    // Otherwise `next` is a finished descendant whose edge
                    // back to `node` already closed a ring.
                }
                None => {
                    stack.pop();
                    chain.retreat(node, stack.last().map(|f| f.node));
                }
            }
        }

        debug_assert!(chain.is_empty());
        cycles
    }
}

impl Frame {
    fn new<A, B>(graph: &Arena<A, B>, node: NodeIndex, arrival: Option<EdgeIndex>) -> Self {
        let mut pending = incident(graph, node);
        pending.reverse();
        Self {
            node,
            arrival,
            pending,
        }
    }
}

/// Incident edges of `node` with the neighbour across each, in ascending
/// edge index order.
pub(crate) fn incident<A, B>(graph: &Arena<A, B>, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut edges: Vec<(EdgeIndex, NodeIndex)> = graph
        .edges(node)
        .map(|er| {
            let other = if er.source() == node {
                er.target()
            } else {
                er.source()
            };
            (er.id(), other)
        })
        .collect();
    edges.sort_unstable();
    edges
}

pub(crate) fn opposite<A, B>(graph: &Arena<A, B>, edge: EdgeIndex, node: NodeIndex) -> Option<NodeIndex> {
    let (a, b) = graph.edge_endpoints(edge)?;
    if a == node {
        Some(b)
    } else if b == node {
        Some(a)
    } else {
        None
    }
}
