use crate::error::{Error, Result};
use crate::following::{MAX_VEL, PROXIMITY_WINDOW};
use crate::graph::check_perfect_square;
use crate::grid::{DEFAULT_ORIGIN, DEFAULT_SPACING};
use crate::math::Point2d;
use crate::util::Interval;

/// The distance from the end of a segment within which a vehicle is placed on the end node.
pub const SNAP_THRESHOLD: f64 = 5.0;

/// The parameters of a simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// The number of nodes in the network; must be a perfect square.
    pub num_nodes: usize,
    /// The number of vehicles spawned by [Simulation::populate](crate::Simulation::populate).
    pub num_vehicles: usize,
    /// The peak speed of the speed profile, in units per tick.
    pub max_vel: f64,
    /// The snap threshold, in units.
    pub snap_threshold: f64,
    /// Distances ahead at which another vehicle on the same segment blocks.
    pub proximity_window: Interval<f64>,
    /// Global factor multiplied with every assigned speed.
    pub velocity_scale: f64,
    /// The coordinates of node 0.
    pub origin: Point2d,
    /// The distance between adjacent grid nodes.
    pub spacing: f64,
    /// Seed for the random number generator; uses entropy if absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_nodes: 64,
            num_vehicles: 512,
            max_vel: MAX_VEL,
            snap_threshold: SNAP_THRESHOLD,
            proximity_window: PROXIMITY_WINDOW,
            velocity_scale: 1.0,
            origin: DEFAULT_ORIGIN.into(),
            spacing: DEFAULT_SPACING,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        check_perfect_square(self.num_nodes)?;
        if !(self.max_vel.is_finite() && self.max_vel >= 0.0) {
            return Err(Error::InvalidConfig("max_vel must be finite and non-negative"));
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold >= 0.0) {
            return Err(Error::InvalidConfig("snap_threshold must be finite and non-negative"));
        }
        if !self.proximity_window.is_valid() {
            return Err(Error::InvalidConfig("proximity_window is inverted"));
        }
        if !(self.velocity_scale.is_finite() && self.velocity_scale >= 0.0) {
            return Err(Error::InvalidConfig("velocity_scale must be finite and non-negative"));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(Error::InvalidConfig("spacing must be positive"));
        }
        Ok(())
    }

    /// Parses a configuration from JSON. Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
