use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use log::{debug, trace};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;

use crate::basis::{candidates, Basis};
use crate::chain::{incident, Chain};
use crate::config::PerceptionConfig;
use crate::cycle::Cycle;
use crate::error::RingError;
use crate::graph::{Arena, ComponentState, Edge, RingId};

/// Outcome of [`GraphManager::remove_edge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Removal<B> {
    /// Payload of the removed edge.
    pub data: B,
    /// `Some` when the edge was a bridge. Holds the nodes that were on the
    /// far side of it, i.e. everything still reachable from the edge's
    /// second endpoint, in ascending index order. Pass them to
    /// [`GraphManager::split_off`] to build the second structure.
    pub split: Option<Vec<NodeIndex>>,
}

impl<B> Removal<B> {
    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }
}

/// Owner of a structure's nodes, edges and rings.
///
/// # Examples
///
/// ```
/// use ringcrab::GraphManager;
///
/// let mut graph = GraphManager::<(), ()>::new();
/// let atoms: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
/// for i in 0..6 {
///     graph.add_edge(atoms[i], atoms[(i + 1) % 6], ()).unwrap();
/// }
/// let rings = graph.fundamental_rings();
/// assert_eq!(rings.len(), 1);
/// assert_eq!(graph.ring_size(rings[0]), Some(6));
///
/// // A chord splits the hexagon into two fused four-membered rings.
/// let chord = graph.add_edge(atoms[0], atoms[3], ()).unwrap();
/// assert_eq!(graph.rings_of(chord).unwrap().len(), 2);
/// ```
pub struct GraphManager<A, B> {
    graph: Arena<A, B>,
    rings: BTreeMap<RingId, Cycle>,
    next_ring: u32,
    config: PerceptionConfig,
}

impl<A, B> GraphManager<A, B> {
    pub fn new() -> Self {
        Self::with_config(PerceptionConfig::default())
    }

    pub fn with_config(config: PerceptionConfig) -> Self {
        Self {
            graph: StableUnGraph::default(),
            rings: BTreeMap::new(),
            next_ring: 0,
            config,
        }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    pub fn graph(&self) -> &StableUnGraph<A, Edge<B>> {
        &self.graph
    }

    /// Register a node. It starts out as its own single-node component.
    pub fn add_node(&mut self, data: A) -> NodeIndex {
        self.graph.add_node(data)
    }

    /// Unregister an isolated node and hand back its payload.
    pub fn remove_node(&mut self, node: NodeIndex) -> Result<A, RingError> {
        self.check_node(node)?;
        let degree = self.graph.edges(node).count();
        if degree > 0 {
            return Err(RingError::NodeHasEdges { node, degree });
        }
        self.graph
            .remove_node(node)
            .ok_or(RingError::UnknownNode(node))
    }

    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, data: B) -> Result<EdgeIndex, RingError> {
        self.check_node(a)?;
        self.check_node(b)?;
        if a == b {
            return Err(RingError::SelfLoop(a));
        }
        if let Some(existing) = self.graph.find_edge(a, b) {
            return Err(RingError::DuplicateEdge { a, b, existing });
        }

        let edge = self.graph.add_edge(a, b, Edge::new(data));
        if self.config.incremental {
            match Chain::incremental(&self.graph, edge) {
                Some(cycle) => {
                    let id = self.publish(cycle);
                    self.simplify(id);
                    self.minimize(a);
                }
                None => trace!("edge {} joins two components", edge.index()),
            }
        } else if self.reach(b, Some(edge)).contains(&a) {
            self.rebuild_component(a);
        }
        Ok(edge)
    }

    /// Remove an edge. Rings through it are discarded and its component
    /// rebuilt; a bridge instead reports the far side in [`Removal::split`].
    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Result<Removal<B>, RingError> {
        let (a, b) = self
            .graph
            .edge_endpoints(edge)
            .ok_or(RingError::UnknownEdge(edge))?;

        let member_of: Vec<RingId> = self.graph[edge].rings().iter().copied().collect();
        for &id in &member_of {
            self.unpublish(id);
        }
        let removed = self
            .graph
            .remove_edge(edge)
            .ok_or(RingError::UnknownEdge(edge))?;

        if !member_of.is_empty() {
            self.rebuild_component(a);
            return Ok(Removal {
                data: removed.data,
                split: None,
            });
        }

        let far_side = self.reach(b, None);
        let split = if far_side.contains(&a) {
            None
        } else {
            debug!(
                "bridge {} removed: {} nodes split off",
                edge.index(),
                far_side.len()
            );
            Some(far_side.into_iter().collect())
        };
        Ok(Removal {
            data: removed.data,
            split,
        })
    }

    /// Move a detached node set, its edges and its rings into a new manager.
    #[allow(clippy::type_complexity)]
    pub fn split_off(
        &mut self,
        nodes: &[NodeIndex],
    ) -> Result<(GraphManager<A, B>, HashMap<NodeIndex, NodeIndex>), RingError> {
        let moved: BTreeSet<NodeIndex> = nodes.iter().copied().collect();
        let mut moved_edges = BTreeSet::new();
        for &node in &moved {
            self.check_node(node)?;
            for (edge, other) in incident(&self.graph, node) {
                if !moved.contains(&other) {
                    return Err(RingError::NotDetached(node));
                }
                moved_edges.insert(edge);
            }
        }

        let cycles: Vec<Cycle> = self
            .rings_within(&moved)
            .into_iter()
            .filter_map(|id| self.unpublish(id))
            .collect();

        let mut detached = Vec::with_capacity(moved_edges.len());
        for edge in moved_edges {
            let (a, b) = self
                .graph
                .edge_endpoints(edge)
                .ok_or(RingError::UnknownEdge(edge))?;
            let weight = self
                .graph
                .remove_edge(edge)
                .ok_or(RingError::UnknownEdge(edge))?;
            detached.push((edge, a, b, weight.data));
        }

        let mut other = GraphManager::with_config(self.config);
        let mut node_map = HashMap::with_capacity(moved.len());
        for node in moved {
            let data = self
                .graph
                .remove_node(node)
                .ok_or(RingError::UnknownNode(node))?;
            node_map.insert(node, other.graph.add_node(data));
        }
        let mut edge_map = HashMap::with_capacity(detached.len());
        for (edge, a, b, data) in detached {
            let new_edge = other
                .graph
                .add_edge(node_map[&a], node_map[&b], Edge::new(data));
            edge_map.insert(edge, new_edge);
        }
        for cycle in cycles {
            let nodes = cycle.nodes().iter().map(|n| node_map[n]).collect();
            let edges = cycle.edges().iter().map(|e| edge_map[e]).collect();
            other.publish(Cycle::from_walk(nodes, edges));
        }

        debug!(
            "split off {} nodes, {} edges, {} rings",
            other.node_count(),
            other.edge_count(),
            other.ring_count()
        );
        Ok((other, node_map))
    }

    /// Discard every ring and rediscover the whole cycle space. Ring ids
    /// restart from zero.
    pub fn update_cycles(&mut self) {
        self.rings.clear();
        self.next_ring = 0;
        for edge in self.graph.edge_indices().collect::<Vec<_>>() {
            self.graph[edge].clear_rings();
        }

        let mut seeds: Vec<NodeIndex> = self.graph.node_indices().collect();
        seeds.sort_unstable();
        let mut visited = HashSet::with_capacity(seeds.len());
        for seed in seeds {
            if visited.contains(&seed) {
                continue;
            }
            let cycles = Chain::full(&self.graph, seed, &mut visited);
            if cycles.is_empty() {
                continue;
            }
            for cycle in cycles {
                let id = self.publish(cycle);
                self.simplify(id);
            }
            self.minimize(seed);
        }
        debug!(
            "full update: {} rings over {} nodes",
            self.rings.len(),
            self.graph.node_count()
        );
    }

    fn rebuild_component(&mut self, node: NodeIndex) {
        let component = self.reach(node, None);
        for id in self.rings_within(&component) {
            self.unpublish(id);
        }

        let Some(&seed) = component.first() else {
            return;
        };
        let mut visited = HashSet::with_capacity(component.len());
        for cycle in Chain::full(&self.graph, seed, &mut visited) {
            let id = self.publish(cycle);
            self.simplify(id);
        }
        self.minimize(seed);
        debug!(
            "rebuilt component of {} nodes from node {}",
            component.len(),
            seed.index()
        );
    }

    fn rings_within(&self, nodes: &BTreeSet<NodeIndex>) -> Vec<RingId> {
        self.rings
            .iter()
            .filter(|(_, cycle)| cycle.nodes().first().is_some_and(|n| nodes.contains(n)))
            .map(|(&id, _)| id)
            .collect()
    }

    fn publish(&mut self, cycle: Cycle) -> RingId {
        if self.next_ring == u32::MAX {
            self.renumber();
        }
        let id = RingId(self.next_ring);
        self.next_ring += 1;
        for &edge in cycle.edges() {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.join_ring(id);
            }
        }
        trace!("published {id} with {} edges", cycle.len());
        self.rings.insert(id, cycle);
        id
    }

    /// Compact ring ids to `0..n`, keeping their order.
    fn renumber(&mut self) {
        let rings = std::mem::take(&mut self.rings);
        for edge in self.graph.edge_indices().collect::<Vec<_>>() {
            self.graph[edge].clear_rings();
        }
        self.next_ring = 0;
        for cycle in rings.into_values() {
            self.publish(cycle);
        }
        debug!("ring ids renumbered, {} rings", self.rings.len());
    }

    fn unpublish(&mut self, id: RingId) -> Option<Cycle> {
        let cycle = self.rings.remove(&id)?;
        for &edge in cycle.edges() {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.leave_ring(id);
            }
        }
        Some(cycle)
    }

    fn replace(&mut self, id: RingId, cycle: Cycle) {
        if let Some(old) = self.rings.get(&id) {
            trace!("{id}: {} edges -> {}", old.len(), cycle.len());
            for &edge in old.edges() {
                if let Some(weight) = self.graph.edge_weight_mut(edge) {
                    weight.leave_ring(id);
                }
            }
        }
        for &edge in cycle.edges() {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.join_ring(id);
            }
        }
        self.rings.insert(id, cycle);
    }

    /// Rings sharing at least one edge with `id`.
    fn partners(&self, id: RingId) -> BTreeSet<RingId> {
        let Some(cycle) = self.rings.get(&id) else {
            return BTreeSet::new();
        };
        cycle
            .edges()
            .iter()
            .filter_map(|&edge| self.graph.edge_weight(edge))
            .flat_map(|weight| weight.rings().iter().copied())
            .filter(|&other| other != id)
            .collect()
    }

    /// Replace the worse of two fused rings by their sum whenever that sum
    /// is a single smaller ring.
    fn simplify(&mut self, start: RingId) {
        if !self.config.simplify {
            return;
        }
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            loop {
                let Some(ring) = self.rings.get(&id) else {
                    break;
                };
                let mut best: Option<(RingId, Cycle)> = None;
                for partner in self.partners(id) {
                    let Some(other) = self.rings.get(&partner) else {
                        continue;
                    };
                    let larger = ring.len().max(other.len());
                    let Some(reduced) =
                        Cycle::from_edges(&self.graph, &ring.symmetric_difference(other))
                    else {
                        continue;
                    };
                    if reduced.len() >= larger {
                        continue;
                    }
                    if best.as_ref().map_or(true, |(_, b)| reduced.len() < b.len()) {
                        best = Some((partner, reduced));
                    }
                }

                let Some((partner, reduced)) = best else {
                    break;
                };
                let victim = self.worse_of(id, partner);
                self.replace(victim, reduced);
                if victim != id {
                    queue.push_back(victim);
                }
            }
        }
    }

    /// Swap rings of `node`'s component for shorter shortest-path rings
    /// that keep them independent, worst ring first, until none applies.
    fn minimize(&mut self, node: NodeIndex) {
        if !self.config.simplify {
            return;
        }
        let component = self.reach(node, None);
        let ids = self.rings_within(&component);
        if ids.len() < 3 {
            return;
        }
        let longest = ids
            .iter()
            .filter_map(|&id| self.ring_size(id))
            .max()
            .unwrap_or(0);
        let pool = candidates(&self.graph, &component, longest);

        loop {
            let swap = {
                let rings: Vec<(RingId, &Cycle)> = ids
                    .iter()
                    .filter_map(|&id| self.rings.get(&id).map(|cycle| (id, cycle)))
                    .collect();
                let cycles: Vec<&Cycle> = rings.iter().map(|&(_, cycle)| cycle).collect();
                let basis = Basis::new(&cycles);
                pool.iter().find_map(|candidate| {
                    let victim = basis
                        .support(candidate)?
                        .into_iter()
                        .map(|i| rings[i].0)
                        .filter(|&id| self.ring_size(id).is_some_and(|len| len > candidate.len()))
                        .reduce(|a, b| self.worse_of(a, b))?;
                    Some((victim, candidate.clone()))
                })
            };
            let Some((victim, cycle)) = swap else {
                break;
            };
            self.replace(victim, cycle);
        }
    }

    fn worse_of(&self, a: RingId, b: RingId) -> RingId {
        match self.is_better_for_bonds(a, b) {
            Some(true) => b,
            _ => a,
        }
    }

    pub fn is_cyclic(&self, edge: EdgeIndex) -> Result<bool, RingError> {
        Ok(self.edge_weight(edge)?.is_cyclic())
    }

    pub fn rings_of(&self, edge: EdgeIndex) -> Result<Vec<RingId>, RingError> {
        Ok(self.edge_weight(edge)?.rings().iter().copied().collect())
    }

    /// Ids of all published rings, ascending.
    pub fn fundamental_rings(&self) -> Vec<RingId> {
        self.rings.keys().copied().collect()
    }

    pub fn rings(&self) -> impl Iterator<Item = (RingId, &Cycle)> + '_ {
        self.rings.iter().map(|(&id, cycle)| (id, cycle))
    }

    pub fn ring(&self, id: RingId) -> Option<&Cycle> {
        self.rings.get(&id)
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn ring_size(&self, id: RingId) -> Option<usize> {
        self.rings.get(&id).map(Cycle::len)
    }

    pub fn ring_nodes(&self, id: RingId) -> Option<&[NodeIndex]> {
        self.rings.get(&id).map(Cycle::nodes)
    }

    pub fn ring_edges(&self, id: RingId) -> Option<&[EdgeIndex]> {
        self.rings.get(&id).map(Cycle::edges)
    }

    /// How many edges of ring `id` also belong to another ring.
    pub fn fused_bonds(&self, id: RingId) -> Option<usize> {
        self.rings
            .get(&id)
            .map(|cycle| cycle.fused_bonds(id, &self.graph))
    }

    /// Whether ring `a` is preferred over ring `b` for their shared bonds.
    pub fn is_better_for_bonds(&self, a: RingId, b: RingId) -> Option<bool> {
        let ring_a = self.rings.get(&a)?;
        let ring_b = self.rings.get(&b)?;
        Some(ring_a.is_better_for_bonds(a, ring_b, b, &self.graph))
    }

    /// The preferred ring among those containing `edge`, if any.
    pub fn primary_ring(&self, edge: EdgeIndex) -> Result<Option<RingId>, RingError> {
        let mut best: Option<RingId> = None;
        for &id in self.edge_weight(edge)?.rings() {
            best = match best {
                Some(current) if self.is_better_for_bonds(current, id) != Some(false) => {
                    Some(current)
                }
                _ => Some(id),
            };
        }
        Ok(best)
    }

    pub fn is_ring_node(&self, node: NodeIndex) -> Result<bool, RingError> {
        self.check_node(node)?;
        Ok(self
            .graph
            .edges(node)
            .any(|er| er.weight().is_cyclic()))
    }

    pub fn node_rings(&self, node: NodeIndex) -> Result<Vec<RingId>, RingError> {
        self.check_node(node)?;
        let rings: BTreeSet<RingId> = incident(&self.graph, node)
            .into_iter()
            .flat_map(|(edge, _)| self.graph[edge].rings().iter().copied())
            .collect();
        Ok(rings.into_iter().collect())
    }

    pub fn smallest_ring_size(&self, node: NodeIndex) -> Result<Option<usize>, RingError> {
        Ok(self
            .node_rings(node)?
            .into_iter()
            .filter_map(|id| self.ring_size(id))
            .min())
    }

    /// Nodes connected to `node`, ascending.
    pub fn component(&self, node: NodeIndex) -> Result<Vec<NodeIndex>, RingError> {
        self.check_node(node)?;
        Ok(self.reach(node, None).into_iter().collect())
    }

    pub fn component_state(&self, node: NodeIndex) -> Result<ComponentState, RingError> {
        let cyclic = self
            .component(node)?
            .into_iter()
            .any(|n| self.graph.edges(n).any(|er| er.weight().is_cyclic()));
        Ok(if cyclic {
            ComponentState::Cyclic
        } else {
            ComponentState::Acyclic
        })
    }

    /// State of the structure as a whole.
    pub fn state(&self) -> ComponentState {
        if self.graph.node_count() == 0 {
            ComponentState::Empty
        } else if self.rings.is_empty() {
            ComponentState::Acyclic
        } else {
            ComponentState::Cyclic
        }
    }

    pub fn component_count(&self) -> usize {
        let mut seen: HashSet<NodeIndex> = HashSet::with_capacity(self.graph.node_count());
        let mut count = 0;
        for node in self.graph.node_indices() {
            if seen.contains(&node) {
                continue;
            }
            count += 1;
            seen.extend(self.reach(node, None));
        }
        count
    }

    /// `E - V + C`: the number of rings a cycle basis has.
    pub fn cyclomatic_number(&self) -> usize {
        (self.graph.edge_count() + self.component_count()).saturating_sub(self.graph.node_count())
    }

    /// Nodes reachable from `start`, optionally pretending `skip` is absent.
    fn reach(&self, start: NodeIndex, skip: Option<EdgeIndex>) -> BTreeSet<NodeIndex> {
        let mut seen = BTreeSet::new();
        if !self.graph.contains_node(start) {
            return seen;
        }
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for (edge, next) in incident(&self.graph, current) {
                if Some(edge) != skip && !seen.contains(&next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.graph.contains_node(node)
    }

    pub fn contains_edge(&self, edge: EdgeIndex) -> bool {
        self.graph.edge_weight(edge).is_some()
    }

    pub fn node(&self, node: NodeIndex) -> Option<&A> {
        self.graph.node_weight(node)
    }

    pub fn node_mut(&mut self, node: NodeIndex) -> Option<&mut A> {
        self.graph.node_weight_mut(node)
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&B> {
        self.graph.edge_weight(edge).map(|weight| &weight.data)
    }

    pub fn edge_mut(&mut self, edge: EdgeIndex) -> Option<&mut B> {
        self.graph.edge_weight_mut(edge).map(|weight| &mut weight.data)
    }

    pub fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// Endpoints in the order they were given to [`add_edge`](Self::add_edge).
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(node)
    }

    pub fn edges_of(&self, node: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(node).map(|er| er.id())
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    fn check_node(&self, node: NodeIndex) -> Result<(), RingError> {
        if self.graph.contains_node(node) {
            Ok(())
        } else {
            Err(RingError::UnknownNode(node))
        }
    }

    fn edge_weight(&self, edge: EdgeIndex) -> Result<&Edge<B>, RingError> {
        self.graph
            .edge_weight(edge)
            .ok_or(RingError::UnknownEdge(edge))
    }
}

impl<A, B> Default for GraphManager<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone, B: Clone> Clone for GraphManager<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            rings: self.rings.clone(),
            next_ring: self.next_ring,
            config: self.config,
        }
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for GraphManager<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphManager")
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .field("rings", &self.rings)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_ring_ids_are_renumbered() {
        let mut graph = GraphManager::<(), ()>::new();
        let n: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (2, 0), (2, 3)] {
            graph.add_edge(n[a], n[b], ()).unwrap();
        }
        assert_eq!(graph.fundamental_rings(), vec![RingId(0)]);

        graph.next_ring = u32::MAX;
        let closing = graph.add_edge(n[3], n[0], ()).unwrap();
        assert_eq!(graph.fundamental_rings(), vec![RingId(0), RingId(1)]);
        assert_eq!(graph.rings_of(closing).unwrap(), vec![RingId(1)]);
        let shared = graph.edge_between(n[0], n[2]).unwrap();
        assert_eq!(graph.rings_of(shared).unwrap(), vec![RingId(0), RingId(1)]);
        assert_eq!(graph.next_ring, 2);
    }

    #[test]
    fn last_id_before_exhaustion_is_used() {
        let mut graph = GraphManager::<(), ()>::new();
        let n: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        graph.next_ring = u32::MAX - 1;
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            graph.add_edge(n[a], n[b], ()).unwrap();
        }
        assert_eq!(graph.fundamental_rings(), vec![RingId(u32::MAX - 1)]);
    }
}
