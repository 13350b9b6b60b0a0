//! The layout of nodes on a square grid.

use crate::math::Point2d;
use crate::NodeId;

/// The default position of node 0.
pub const DEFAULT_ORIGIN: [f64; 2] = [200.0, 200.0];

/// The default distance between neighbouring nodes.
pub const DEFAULT_SPACING: f64 = 100.0;

/// Maps node indices to coordinates on a square grid.
///
/// Node `n` lies in row `n / side` and column `n % side`. The row selects
/// the x coordinate and the column the y coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    side: usize,
    origin: Point2d,
    spacing: f64,
}

impl Grid {
    /// Creates the layout for a network of `num_nodes` nodes.
    /// The side length is `floor(sqrt(num_nodes))`.
    pub fn new(num_nodes: usize, origin: Point2d, spacing: f64) -> Self {
        Self {
            side: (num_nodes as f64).sqrt() as usize,
            origin,
            spacing,
        }
    }

    /// The number of nodes along each side of the grid.
    pub fn side(&self) -> usize {
        self.side
    }

    /// The number of nodes which have a position on the grid.
    pub fn num_nodes(&self) -> usize {
        self.side * self.side
    }

    /// The row of the node.
    pub fn row_of(&self, node: NodeId) -> usize {
        node / self.side
    }

    /// The column of the node.
    pub fn col_of(&self, node: NodeId) -> usize {
        node % self.side
    }

    /// The coordinates of the node.
    /// Only nodes in `[0, side²)` have a meaningful position.
    pub fn coord_of(&self, node: NodeId) -> Point2d {
        Point2d::new(
            self.origin.x + self.row_of(node) as f64 * self.spacing,
            self.origin.y + self.col_of(node) as f64 * self.spacing,
        )
    }

    /// Whether the nodes are one step apart horizontally, vertically or diagonally.
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        let rows = self.row_of(a).abs_diff(self.row_of(b));
        let cols = self.col_of(a).abs_diff(self.col_of(b));
        rows <= 1 && cols <= 1 && (rows, cols) != (0, 0)
    }

    /// The coordinates of every node, in index order.
    pub fn points(&self) -> Vec<Point2d> {
        (0..self.num_nodes()).map(|n| self.coord_of(n)).collect()
    }

    /// The size of a canvas which fits the whole grid with a margin on each side.
    pub fn window_dimensions(&self) -> (f64, f64) {
        let extent = self.spacing * (self.side + 1) as f64;
        (self.origin.x + extent, self.origin.y + extent)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(64, DEFAULT_ORIGIN.into(), DEFAULT_SPACING)
    }
}
