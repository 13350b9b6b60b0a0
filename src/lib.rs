//! A small traffic simulation of vehicles wandering a randomly generated road
//! network laid out on a square grid.
//!
//! Each tick, the [FollowingModel] computes a speed for every vehicle from a
//! bell-shaped profile over its progress along the current road, throttled by
//! any slower vehicles just ahead of it on the same road. Every vehicle is
//! then advanced by its speed, and vehicles reaching the end of a road pick
//! a random road leaving that node.

pub use cgmath;
pub use config::SimulationConfig;
pub use error::{Error, Result};
pub use following::{profile_speed, BlockingNeighbour, FollowingModel};
pub use graph::{Neighbours, RoadGraph, RoadKind, Segment, EDGE_PROBABILITY};
pub use grid::Grid;
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::Vehicle;

mod config;
mod debug;
mod error;
pub mod following;
mod graph;
pub mod grid;
pub mod math;
mod simulation;
mod util;
mod vehicle;

/// Index of a node in the road network.
pub type NodeId = usize;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
