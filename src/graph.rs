use crate::error::{Error, Result};
use crate::NodeId;
use smallvec::SmallVec;

pub use generate::EDGE_PROBABILITY;

mod generate;

/// The nodes reachable from a single node.
/// A grid node has at most eight neighbours.
pub type Neighbours = SmallVec<[NodeId; 8]>;

/// A directed road network over grid-positioned nodes.
///
/// The network is immutable once built, so it can be shared freely
/// between the vehicles and the following model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoadGraph {
    /// The number of nodes.
    num_nodes: usize,
    /// Row-major adjacency matrix; `edges[a * num_nodes + b]` permits travel from `a` to `b`.
    edges: Vec<bool>,
}

/// A directed road between two adjacent nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// The node the road starts at.
    pub from: NodeId,
    /// The node the road leads to.
    pub to: NodeId,
}

/// Whether a road can be travelled in one or both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoadKind {
    /// Both `a -> b` and `b -> a` exist.
    TwoWay,
    /// Only `a -> b` exists.
    OneWay,
}

impl Segment {
    /// Creates a new segment.
    pub const fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl RoadGraph {
    /// Creates a network with no roads.
    pub fn empty(num_nodes: usize) -> Result<Self> {
        check_perfect_square(num_nodes)?;
        Ok(Self {
            num_nodes,
            edges: vec![false; num_nodes * num_nodes],
        })
    }

    /// Creates a network from a square boolean adjacency matrix,
    /// where `matrix[a][b]` permits travel from `a` to `b`.
    /// Entries on the diagonal are ignored.
    pub fn from_matrix(matrix: &[Vec<bool>]) -> Result<Self> {
        let rows = matrix.len();
        let mut graph = Self::empty(rows)?;
        for (a, row) in matrix.iter().enumerate() {
            if row.len() != rows {
                return Err(Error::NotSquareMatrix {
                    rows,
                    row: a,
                    len: row.len(),
                });
            }
            for (b, &edge) in row.iter().enumerate() {
                if edge && a != b {
                    graph.edges[a * rows + b] = true;
                }
            }
        }
        Ok(graph)
    }

    /// Creates a network from a list of directed roads.
    pub fn from_edges(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Result<Self> {
        let mut graph = Self::empty(num_nodes)?;
        for &(a, b) in edges {
            graph.check_node(a)?;
            graph.check_node(b)?;
            if a != b {
                graph.edges[a * num_nodes + b] = true;
            }
        }
        Ok(graph)
    }

    /// The number of nodes in the network.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The number of directed roads in the network.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().filter(|e| **e).count()
    }

    /// Whether travel from `a` to `b` is permitted.
    /// Nodes outside the network have no roads.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        a < self.num_nodes && b < self.num_nodes && self.edges[a * self.num_nodes + b]
    }

    /// All the nodes which can be travelled to directly from `node`, in ascending order.
    pub fn reachable_from(&self, node: NodeId) -> Result<Neighbours> {
        self.check_node(node)?;
        let row = &self.edges[node * self.num_nodes..(node + 1) * self.num_nodes];
        Ok(row
            .iter()
            .enumerate()
            .filter(|(_, edge)| **edge)
            .map(|(b, _)| b)
            .collect())
    }

    /// Iterates over every directed road in row-major order.
    pub fn connections(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.num_nodes;
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| **edge)
            .map(move |(idx, _)| Segment::new(idx / n, idx % n))
    }

    /// Classifies the road from `a` to `b`, if there is one.
    pub fn road_kind(&self, a: NodeId, b: NodeId) -> Option<RoadKind> {
        match (self.has_edge(a, b), self.has_edge(b, a)) {
            (true, true) => Some(RoadKind::TwoWay),
            (true, false) => Some(RoadKind::OneWay),
            _ => None,
        }
    }

    /// The nodes with no outgoing roads.
    pub fn dead_ends(&self) -> Vec<NodeId> {
        (0..self.num_nodes)
            .filter(|a| !self.edges[a * self.num_nodes..(a + 1) * self.num_nodes].contains(&true))
            .collect()
    }

    /// Returns an error unless `node` is in `[0, num_nodes)`.
    pub(crate) fn check_node(&self, node: NodeId) -> Result<()> {
        if node < self.num_nodes {
            Ok(())
        } else {
            Err(Error::InvalidNode {
                node,
                num_nodes: self.num_nodes,
            })
        }
    }
}

/// Returns an error unless `n` is a non-zero perfect square.
pub(crate) fn check_perfect_square(n: usize) -> Result<()> {
    let side = (n as f64).sqrt() as usize;
    if n > 0 && side * side == n {
        Ok(())
    } else {
        Err(Error::NotPerfectSquare(n))
    }
}
