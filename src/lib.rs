//! Ring perception and ring-membership maintenance for mutable molecular
//! graphs.
//!
//! A [`GraphManager`] owns the atoms (nodes), bonds (edges) and rings of one
//! structure. As bonds are added and removed it keeps every bond's ring
//! membership current, reduces fused detections to small fundamental rings,
//! and reports when removing a bond splits the structure in two.

mod basis;
pub mod chain;
pub mod config;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod manager;

pub use chain::{Chain, Link};
pub use config::PerceptionConfig;
pub use cycle::Cycle;
pub use error::{ErrorKind, RingError};
pub use graph::{ComponentState, Edge, RingId};
pub use manager::{GraphManager, Removal};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
