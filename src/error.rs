use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

/// Broad category of a rejected call.
///
/// Every [`RingError`] is a precondition violation by the caller and falls
/// into one of these two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidNode,
    InvalidEdge,
}

/// Error returned when a graph mutation or query is rejected.
///
/// A rejected mutation leaves the graph and all ring state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    /// The node is not registered with this graph.
    #[error("node {} is not registered with this graph", .0.index())]
    UnknownNode(NodeIndex),
    /// The node cannot be removed while edges still reference it.
    #[error("node {} still has {degree} incident edges", .node.index())]
    NodeHasEdges { node: NodeIndex, degree: usize },
    /// The node is still bonded to a node outside the set being split off.
    #[error("node {} is bonded to a node outside the split-off set", .0.index())]
    NotDetached(NodeIndex),
    /// The edge is not registered with this graph.
    #[error("edge {} is not registered with this graph", .0.index())]
    UnknownEdge(EdgeIndex),
    /// Both endpoints of the requested edge are the same node.
    #[error("cannot join node {} to itself", .0.index())]
    SelfLoop(NodeIndex),
    /// An edge between the two nodes already exists.
    #[error(
        "nodes {} and {} are already joined by edge {}",
        .a.index(),
        .b.index(),
        .existing.index()
    )]
    DuplicateEdge {
        a: NodeIndex,
        b: NodeIndex,
        existing: EdgeIndex,
    },
}

impl RingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownNode(_) | Self::NodeHasEdges { .. } | Self::NotDetached(_) => ErrorKind::InvalidNode,
            Self::UnknownEdge(_) | Self::SelfLoop(_) | Self::DuplicateEdge { .. } => {
                ErrorKind::InvalidEdge
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let n = NodeIndex::new(3);
        let e = EdgeIndex::new(7);
        assert_eq!(RingError::UnknownNode(n).kind(), ErrorKind::InvalidNode);
        assert_eq!(
            RingError::NodeHasEdges { node: n, degree: 2 }.kind(),
            ErrorKind::InvalidNode
        );
        assert_eq!(RingError::NotDetached(n).kind(), ErrorKind::InvalidNode);
        assert_eq!(RingError::UnknownEdge(e).kind(), ErrorKind::InvalidEdge);
        assert_eq!(RingError::SelfLoop(n).kind(), ErrorKind::InvalidEdge);
        assert_eq!(
            RingError::DuplicateEdge {
                a: n,
                b: NodeIndex::new(4),
                existing: e
            }
            .kind(),
            ErrorKind::InvalidEdge
        );
    }

    #[test]
    fn display() {
        let err = RingError::DuplicateEdge {
            a: NodeIndex::new(1),
            b: NodeIndex::new(2),
            existing: EdgeIndex::new(0),
        };
        assert_eq!(err.to_string(), "nodes 1 and 2 are already joined by edge 0");
        assert_eq!(
            RingError::UnknownNode(NodeIndex::new(9)).to_string(),
            "node 9 is not registered with this graph"
        );
        assert_eq!(
            RingError::NodeHasEdges {
                node: NodeIndex::new(5),
                degree: 3
            }
            .to_string(),
            "node 5 still has 3 incident edges"
        );
    }
}
