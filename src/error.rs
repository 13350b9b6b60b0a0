use crate::{NodeId, VehicleId};
use thiserror::Error;

/// An error raised by the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A node index outside of `[0, num_nodes)` was queried.
    #[error("invalid node {node} (network has {num_nodes} nodes)")]
    InvalidNode { node: NodeId, num_nodes: usize },
    /// A vehicle was created at a node outside of `[0, num_nodes)`.
    #[error("invalid starting node {node} (network has {num_nodes} nodes)")]
    InvalidStart { node: NodeId, num_nodes: usize },
    /// A row of the adjacency matrix has the wrong length.
    #[error("adjacency matrix is not square: row {row} has {len} entries, expected {rows}")]
    NotSquareMatrix { rows: usize, row: usize, len: usize },
    /// The number of nodes does not form a square grid.
    #[error("node count {0} is not a perfect square")]
    NotPerfectSquare(usize),
    /// There is no road between the two nodes.
    #[error("no road from node {from} to node {to}")]
    NoSuchEdge { from: NodeId, to: NodeId },
    /// The vehicle is not part of the simulation.
    #[error("unknown vehicle {0:?}")]
    UnknownVehicle(VehicleId),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A specialised result type for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;
