use super::{check_perfect_square, RoadGraph};
use crate::error::Result;
use crate::grid::Grid;
use rand::Rng;

/// The probability of each directed road between adjacent nodes existing.
pub const EDGE_PROBABILITY: f64 = 0.5;

impl RoadGraph {
    /// Generates a random network of `num_nodes` nodes laid out on a square grid.
    ///
    /// Each ordered pair of distinct, adjacent nodes (including diagonals) is
    /// connected independently with probability [`EDGE_PROBABILITY`], so a road
    /// may end up one-way or two-way.
    pub fn random<R: Rng + ?Sized>(num_nodes: usize, rng: &mut R) -> Result<Self> {
        check_perfect_square(num_nodes)?;
        let grid = Grid::new(num_nodes, [0.0, 0.0].into(), 1.0);
        let mut graph = Self::empty(num_nodes)?;
        for a in 0..num_nodes {
            for b in 0..num_nodes {
                if grid.are_adjacent(a, b) && rng.gen_bool(EDGE_PROBABILITY) {
                    graph.edges[a * num_nodes + b] = true;
                }
            }
        }
        Ok(graph)
    }
}
