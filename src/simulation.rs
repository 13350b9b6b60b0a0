use crate::config::SimulationConfig;
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::debug_vehicle;
use crate::error::{Error, Result};
use crate::following::FollowingModel;
use crate::graph::{RoadGraph, Segment};
use crate::grid::Grid;
use crate::vehicle::Vehicle;
use crate::{NodeId, VehicleId, VehicleSet};
use log::{info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

/// A traffic simulation.
pub struct Simulation {
    /// The simulation parameters.
    config: SimulationConfig,
    /// The road network.
    graph: RoadGraph,
    /// The layout of the network's nodes.
    grid: Grid,
    /// The car following model.
    model: FollowingModel,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The source of randomness for route choices.
    rng: StdRng,
    /// The current frame of simulation.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a simulation over an existing road network.
    /// The network's node count takes precedence over `config.num_nodes`.
    pub fn new(config: SimulationConfig, graph: RoadGraph) -> Result<Self> {
        let config = SimulationConfig {
            num_nodes: graph.num_nodes(),
            ..config
        };
        config.validate()?;
        Ok(Self::with_rng(config, graph, make_rng(config.seed)))
    }

    /// Creates a simulation over a randomly generated road network.
    pub fn random(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = make_rng(config.seed);
        let graph = RoadGraph::random(config.num_nodes, &mut rng)?;
        Ok(Self::with_rng(config, graph, rng))
    }

    fn with_rng(config: SimulationConfig, graph: RoadGraph, rng: StdRng) -> Self {
        info!(
            "created network of {} nodes with {} roads and {} dead ends",
            graph.num_nodes(),
            graph.num_edges(),
            graph.dead_ends().len()
        );
        Self {
            grid: Grid::new(config.num_nodes, config.origin, config.spacing),
            model: FollowingModel::new(config.max_vel, config.proximity_window),
            config,
            graph,
            vehicles: VehicleSet::default(),
            rng,
            frame: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Adds a vehicle at the given node and sends it along a random road.
    pub fn add_vehicle(&mut self, start: NodeId) -> Result<VehicleId> {
        let (graph, grid) = (&self.graph, &self.grid);
        let vehicle_id = self
            .vehicles
            .try_insert_with_key(|id| Vehicle::new(id, start, graph, grid))?;
        self.vehicles[vehicle_id].choose_random_segment(&self.graph, &self.grid, &mut self.rng)?;
        Ok(vehicle_id)
    }

    /// Adds `config.num_vehicles` vehicles at random nodes.
    pub fn populate(&mut self) -> Result<()> {
        for _ in 0..self.config.num_vehicles {
            let start = self.rng.gen_range(0..self.graph.num_nodes());
            self.add_vehicle(start)?;
        }
        info!("populated {} vehicles", self.vehicles.len());
        Ok(())
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, vehicle_id: VehicleId) -> Option<Vehicle> {
        self.vehicles.remove(vehicle_id)
    }

    /// Places a vehicle at the start of the road from its current node to `to`.
    /// This is how an idle vehicle at a dead end can be put back into motion.
    pub fn set_vehicle_segment(&mut self, vehicle_id: VehicleId, to: NodeId) -> Result<()> {
        let vehicle = self
            .vehicles
            .get_mut(vehicle_id)
            .ok_or(Error::UnknownVehicle(vehicle_id))?;
        let from = vehicle.node();
        if !self.graph.has_edge(from, to) {
            return Err(Error::NoSuchEdge { from, to });
        }
        vehicle.set_segment(Segment::new(from, to), &self.grid);
        Ok(())
    }

    /// Sets the global factor multiplied with every vehicle's speed.
    pub fn set_velocity_scale(&mut self, scale: f64) -> Result<()> {
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(Error::InvalidConfig("velocity_scale must be finite and non-negative"));
        }
        self.config.velocity_scale = scale;
        Ok(())
    }

    /// The global speed factor.
    pub fn velocity_scale(&self) -> f64 {
        self.config.velocity_scale
    }

    /// Randomly assigns a velocity adjustment factor to each vehicle,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`.
    pub fn randomise_velocity_adjusts(&mut self, stddev: f64) -> Result<()> {
        let distr = rand_distr::Normal::new(1.0, stddev)
            .map_err(|_| Error::InvalidConfig("invalid standard deviation"))?;
        for vehicle in self.vehicles.values_mut() {
            let factor = distr.sample(&mut self.rng).clamp(0.75, 1.25);
            vehicle.set_velocity_adjust(factor);
        }
        Ok(())
    }

    /// Advances the simulation by one tick.
    ///
    /// Every vehicle's speed is computed from the state at the start of the
    /// tick before any vehicle moves.
    pub fn step(&mut self) -> Result<()> {
        trace!("frame {}", self.frame);
        let speeds = self.model.compute_speeds(&self.vehicles, &self.grid);
        self.apply_speeds(&speeds)?;
        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
        Ok(())
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The simulation parameters.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The road network.
    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// The layout of the network's nodes.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Records the assigned speeds, then moves every vehicle.
    fn apply_speeds(&mut self, speeds: &[(VehicleId, f64)]) -> Result<()> {
        let scale = self.config.velocity_scale;
        for &(vehicle_id, speed) in speeds {
            let vehicle = &mut self.vehicles[vehicle_id];
            vehicle.set_vel(speed);
            vehicle.advance(
                speed * scale,
                self.config.snap_threshold,
                &self.graph,
                &self.grid,
                &mut self.rng,
            )?;
            debug_vehicle(vehicle);
        }
        Ok(())
    }
}

/// Seeds the random number generator, from entropy if there is no seed.
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
