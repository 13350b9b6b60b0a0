//! The car following model.

use crate::graph::Segment;
use crate::grid::Grid;
use crate::util::Interval;
use crate::vehicle::Vehicle;
use crate::{VehicleId, VehicleSet};
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::HashMap;

/// The default top speed, in units per tick (5 units at 60 ticks/s = 300 units/s).
pub const MAX_VEL: f64 = 5.0;

/// The default range of distances ahead within which another vehicle blocks.
pub const PROXIMITY_WINDOW: Interval<f64> = Interval::new(0.0, 20.0);

/// Computes the speed each vehicle should travel at during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowingModel {
    /// The peak of the speed profile.
    max_vel: f64,
    /// Distances ahead, relative to the segment start, at which another vehicle blocks.
    window: Interval<f64>,
}

/// A vehicle on the same directed segment and within the proximity window ahead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockingNeighbour {
    pub id: VehicleId,
    /// How far ahead of the subject vehicle the neighbour is.
    pub proximity: f64,
    /// The neighbour's speed from the previous tick.
    pub vel: f64,
}

/// The speed along a segment as a function of the fraction travelled.
///
/// A bell curve peaking at `max_vel` half way along the segment, so vehicles
/// speed up leaving a node and slow down approaching the next one.
pub fn profile_speed(travelled: f64, max_vel: f64) -> f64 {
    max_vel * f64::exp(-2.0 * max_vel * (travelled - 0.5).powi(2))
}

impl FollowingModel {
    /// Creates a new following model.
    pub fn new(max_vel: f64, window: Interval<f64>) -> Self {
        Self { max_vel, window }
    }

    /// The speed the vehicle would travel at with no one in its way,
    /// scaled by its velocity adjustment. Idle vehicles have a target speed of zero.
    pub fn target_speed(&self, vehicle: &Vehicle, grid: &Grid) -> f64 {
        vehicle
            .travelled(grid)
            .map(|travelled| vehicle.velocity_adjust() * profile_speed(travelled, self.max_vel))
            .unwrap_or(0.0)
    }

    /// Finds the vehicles blocking `vehicle`, from the candidates sharing its segment.
    pub fn blocking_neighbours<'a>(
        &self,
        vehicle: &Vehicle,
        candidates: impl IntoIterator<Item = &'a Vehicle>,
        grid: &Grid,
    ) -> SmallVec<[BlockingNeighbour; 4]> {
        let (segment, own_dist) = match (vehicle.segment(), vehicle.distance_from_start(grid)) {
            (Some(segment), Some(dist)) => (segment, dist),
            _ => return SmallVec::new(),
        };

        candidates
            .into_iter()
            .filter(|other| other.id() != vehicle.id() && other.segment() == Some(segment))
            .filter_map(|other| {
                Some(BlockingNeighbour {
                    id: other.id(),
                    proximity: other.distance_from_start(grid)? - own_dist,
                    vel: other.vel(),
                })
            })
            .filter(|n| self.window.contains(n.proximity))
            .collect()
    }

    /// Limits the target speed to that of the slowest blocking neighbour.
    ///
    /// Note the neighbour is chosen by lowest speed, not by nearest proximity,
    /// so a slow vehicle further ahead throttles harder than a fast one just ahead.
    pub fn assigned_speed(&self, target_speed: f64, neighbours: &[BlockingNeighbour]) -> f64 {
        neighbours
            .iter()
            .min_by(|a, b| a.vel.total_cmp(&b.vel))
            .map(|closest| f64::min(target_speed, closest.vel))
            .unwrap_or(target_speed)
    }

    /// Computes the speed of a single vehicle given the rest of the fleet.
    pub fn speed_of(&self, vehicle: &Vehicle, vehicles: &VehicleSet, grid: &Grid) -> f64 {
        let neighbours = self.blocking_neighbours(vehicle, vehicles.values(), grid);
        self.assigned_speed(self.target_speed(vehicle, grid), &neighbours)
    }

    /// Computes the speed of every vehicle from a snapshot of the fleet.
    ///
    /// The fleet is only borrowed immutably, so every speed is based on the
    /// positions and speeds from before the tick. Vehicles are grouped by
    /// segment once, rather than scanning the whole fleet per vehicle.
    pub fn compute_speeds(&self, vehicles: &VehicleSet, grid: &Grid) -> Vec<(VehicleId, f64)> {
        let by_segment: HashMap<Segment, Vec<&Vehicle>> = vehicles
            .values()
            .filter_map(|veh| veh.segment().map(|seg| (seg, veh)))
            .into_group_map();

        vehicles
            .values()
            .map(|veh| {
                let target = self.target_speed(veh, grid);
                let speed = match veh.segment().and_then(|seg| by_segment.get(&seg)) {
                    Some(group) => {
                        let neighbours = self.blocking_neighbours(veh, group.iter().copied(), grid);
                        self.assigned_speed(target, &neighbours)
                    }
                    None => target,
                };
                (veh.id(), speed)
            })
            .collect()
    }
}

impl Default for FollowingModel {
    fn default() -> Self {
        Self::new(MAX_VEL, PROXIMITY_WINDOW)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::RoadGraph;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    struct Scenario {
        graph: RoadGraph,
        grid: Grid,
        vehicles: VehicleSet,
    }

    impl Scenario {
        /// A 2x2 grid with a two-way road 0-1 and a one-way road 0 -> 2.
        fn new() -> Self {
            Self {
                graph: RoadGraph::from_edges(4, &[(0, 1), (1, 0), (0, 2)]).unwrap(),
                grid: Grid::new(4, [200.0, 200.0].into(), 100.0),
                vehicles: VehicleSet::default(),
            }
        }

        /// Adds a vehicle on `segment` at `dist` units from its start.
        fn place(&mut self, segment: Segment, dist: f64, vel: f64) -> VehicleId {
            let (graph, grid) = (&self.graph, &self.grid);
            self.vehicles.insert_with_key(|id| {
                let mut v = Vehicle::new(id, segment.from, graph, grid).unwrap();
                v.set_segment(segment, grid);
                let dir = v.direction();
                v.set_position(grid.coord_of(segment.from) + dist * dir);
                v.set_vel(vel);
                v
            })
        }

        fn speed(&self, id: VehicleId) -> f64 {
            let model = FollowingModel::default();
            let speeds = model.compute_speeds(&self.vehicles, &self.grid);
            speeds.into_iter().find(|(v, _)| *v == id).unwrap().1
        }
    }

    #[test]
    fn peak_at_mid_segment() {
        assert_approx_eq!(profile_speed(0.5, MAX_VEL), 5.0);
        assert!(profile_speed(0.0, MAX_VEL) < profile_speed(0.25, MAX_VEL));
        assert!(profile_speed(1.05, MAX_VEL) < profile_speed(1.0, MAX_VEL));
    }

    #[test]
    fn free_road_uses_profile() {
        let mut s = Scenario::new();
        let id = s.place(Segment::new(0, 1), 50.0, 0.0);
        assert_approx_eq!(s.speed(id), 5.0);
    }

    #[test]
    fn idle_vehicle_has_zero_speed() {
        let mut s = Scenario::new();
        let (graph, grid) = (&s.graph, &s.grid);
        let id = s
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, 3, graph, grid).unwrap());
        assert_eq!(s.speed(id), 0.0);
    }

    #[test]
    fn follows_slower_vehicle_ahead() {
        let mut s = Scenario::new();
        let d = (1.25f64.ln() / 10.0).sqrt();
        let b = s.place(Segment::new(0, 1), 100.0 * (0.5 - d), 0.0);
        s.place(Segment::new(0, 1), 100.0 * (0.5 - d) + 10.0, 2.0);
        let target = FollowingModel::default().target_speed(&s.vehicles[b], &s.grid);
        assert_approx_eq!(target, 4.0);
        assert_approx_eq!(s.speed(b), 2.0);
    }

    #[test]
    fn faster_vehicle_ahead_does_not_limit() {
        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 50.0, 0.0);
        s.place(Segment::new(0, 1), 60.0, 7.0);
        assert_approx_eq!(s.speed(b), 5.0);
    }

    #[test]
    fn window_is_inclusive() {
        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 30.0, 0.0);
        s.place(Segment::new(0, 1), 50.0, 1.0);
        assert_approx_eq!(s.speed(b), 1.0);

        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 50.0, 0.0);
        let a = s.place(Segment::new(0, 1), 50.0, 1.5);
        // Co-located vehicles block each other.
        assert_approx_eq!(s.speed(b), 1.5);
        assert_approx_eq!(s.speed(a), 0.0);
    }

    #[test]
    fn ignores_vehicles_outside_window() {
        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 30.0, 0.0);
        s.place(Segment::new(0, 1), 50.5, 1.0);
        s.place(Segment::new(0, 1), 20.0, 0.5);
        assert_approx_eq!(s.speed(b), profile_speed(0.3, MAX_VEL));
    }

    #[test]
    fn opposite_direction_is_not_a_neighbour() {
        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 50.0, 0.0);
        // 45 units from node 1 is 55 from node 0, i.e. 5 units ahead of `b`.
        s.place(Segment::new(1, 0), 45.0, 0.5);
        assert_approx_eq!(s.speed(b), 5.0);
    }

    #[test]
    fn slowest_neighbour_wins_over_nearest() {
        let mut s = Scenario::new();
        let b = s.place(Segment::new(0, 1), 40.0, 0.0);
        s.place(Segment::new(0, 1), 42.0, 3.0);
        s.place(Segment::new(0, 1), 59.0, 1.0);
        assert_approx_eq!(s.speed(b), 1.0);
    }

    #[test]
    fn snapshot_matches_single_queries() {
        let mut s = Scenario::new();
        s.place(Segment::new(0, 1), 10.0, 0.3);
        s.place(Segment::new(0, 1), 25.0, 1.2);
        s.place(Segment::new(0, 1), 40.0, 0.8);
        s.place(Segment::new(0, 2), 70.0, 0.1);
        let model = FollowingModel::default();
        for (id, speed) in model.compute_speeds(&s.vehicles, &s.grid) {
            let single = model.speed_of(&s.vehicles[id], &s.vehicles, &s.grid);
            assert_approx_eq!(speed, single);
        }
    }

    proptest! {
        #[test]
        fn profile_is_symmetric(d in -2.0f64..2.0) {
            let a = profile_speed(0.5 - d, MAX_VEL);
            let b = profile_speed(0.5 + d, MAX_VEL);
            prop_assert!((a - b).abs() < 1e-12);
            prop_assert!(a <= MAX_VEL);
        }
    }
}
