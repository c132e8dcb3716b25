use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::chain::{incident, opposite};
use crate::cycle::Cycle;
use crate::graph::Arena;

/// Shortest-path rings of one component, shorter than `below`, ascending by
/// length and then by edge set.
///
/// For every root, each edge off the root's breadth-first tree closes the
/// tree paths to its two ends into a ring. Every minimum cycle basis of the
/// component is drawn from these.
pub(crate) fn candidates<A, B>(
    graph: &Arena<A, B>,
    component: &BTreeSet<NodeIndex>,
    below: usize,
) -> Vec<Cycle> {
    let mut edges: Vec<(EdgeIndex, NodeIndex, NodeIndex)> = Vec::new();
    for &node in component {
        for (edge, other) in incident(graph, node) {
            if node < other {
                edges.push((edge, node, other));
            }
        }
    }

    let mut found: BTreeMap<(usize, BTreeSet<EdgeIndex>), Cycle> = BTreeMap::new();
    for &root in component {
        let tree = shortest_tree(graph, root);
        for &(edge, u, v) in &edges {
            let (Some(&(du, pu)), Some(&(dv, pv))) = (tree.get(&u), tree.get(&v)) else {
                continue;
            };
            if pu == Some(edge) || pv == Some(edge) {
                continue;
            }
            let len = du + dv + 1;
            if len < 3 || len >= below {
                continue;
            }
            let mut set = path_edges(&tree, graph, u);
            for e in path_edges(&tree, graph, v) {
                if !set.remove(&e) {
                    set.insert(e);
                }
            }
            set.insert(edge);
            if set.len() != len {
                // The two tree paths meet below the root.
                continue;
            }
            if let Some(cycle) = Cycle::from_edges(graph, &set) {
                found.entry((len, set)).or_insert(cycle);
            }
        }
    }
    found.into_values().collect()
}

type Tree = HashMap<NodeIndex, (usize, Option<EdgeIndex>)>;

fn shortest_tree<A, B>(graph: &Arena<A, B>, root: NodeIndex) -> Tree {
    let mut tree = HashMap::from([(root, (0, None))]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let depth = tree[&current].0;
        for (edge, next) in incident(graph, current) {
            if !tree.contains_key(&next) {
                tree.insert(next, (depth + 1, Some(edge)));
                queue.push_back(next);
            }
        }
    }
    tree
}

fn path_edges<A, B>(tree: &Tree, graph: &Arena<A, B>, mut node: NodeIndex) -> BTreeSet<EdgeIndex> {
    let mut edges = BTreeSet::new();
    while let Some(&(_, Some(edge))) = tree.get(&node) {
        edges.insert(edge);
        let Some(prev) = opposite(graph, edge, node) else {
            break;
        };
        node = prev;
    }
    edges
}

/// GF(2) elimination over a list of rings that remembers, for each row,
/// which of the original rings were combined into it.
pub(crate) struct Basis {
    slots: HashMap<EdgeIndex, usize>,
    words: usize,
    rows: Vec<Row>,
}

struct Row {
    bits: Vec<u64>,
    pivot: usize,
    members: Vec<u64>,
}

impl Basis {
    pub(crate) fn new(rings: &[&Cycle]) -> Self {
        let mut slots = HashMap::new();
        for ring in rings {
            for &edge in ring.edges() {
                let next = slots.len();
                slots.entry(edge).or_insert(next);
            }
        }
        let mut basis = Self {
            words: slots.len().div_ceil(64),
            slots,
            rows: Vec::with_capacity(rings.len()),
        };
        let member_words = rings.len().div_ceil(64);
        for (i, ring) in rings.iter().enumerate() {
            let Some(bits) = basis.to_bits(ring) else {
                continue;
            };
            let mut members = vec![0u64; member_words];
            members[i / 64] |= 1u64 << (i % 64);
            let (bits, members) = basis.reduce(bits, members);
            if let Some(pivot) = leading_bit(&bits) {
                basis.rows.push(Row {
                    bits,
                    pivot,
                    members,
                });
            }
        }
        basis
    }

    /// Positions of the rings whose sum is `cycle`, or `None` when it is
    /// outside their span.
    pub(crate) fn support(&self, cycle: &Cycle) -> Option<Vec<usize>> {
        let bits = self.to_bits(cycle)?;
        let member_words = self.rows.first().map_or(0, |row| row.members.len());
        let (rest, members) = self.reduce(bits, vec![0u64; member_words]);
        if rest.iter().any(|&w| w != 0) {
            return None;
        }
        Some(
            (0..member_words * 64)
                .filter(|&i| members[i / 64] & (1u64 << (i % 64)) != 0)
                .collect(),
        )
    }

    fn to_bits(&self, cycle: &Cycle) -> Option<Vec<u64>> {
        let mut bits = vec![0u64; self.words];
        for edge in cycle.edges() {
            let slot = *self.slots.get(edge)?;
            bits[slot / 64] |= 1u64 << (slot % 64);
        }
        Some(bits)
    }

    fn reduce(&self, mut bits: Vec<u64>, mut members: Vec<u64>) -> (Vec<u64>, Vec<u64>) {
        for row in &self.rows {
            if bits[row.pivot / 64] & (1u64 << (row.pivot % 64)) != 0 {
                xor_into(&mut bits, &row.bits);
                xor_into(&mut members, &row.members);
            }
        }
        (bits, members)
    }
}

fn leading_bit(bits: &[u64]) -> Option<usize> {
    bits.iter()
        .enumerate()
        .find(|&(_, &word)| word != 0)
        .map(|(i, &word)| i * 64 + word.trailing_zeros() as usize)
}

fn xor_into(a: &mut [u64], b: &[u64]) {
    for (aw, bw) in a.iter_mut().zip(b) {
        *aw ^= *bw;
    }
}
