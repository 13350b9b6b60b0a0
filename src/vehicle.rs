use crate::error::{Error, Result};
use crate::graph::{RoadGraph, Segment};
use crate::grid::Grid;
use crate::math::{heading, unit, Point2d, Vector2d};
use crate::{NodeId, VehicleId};
use cgmath::prelude::*;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

/// A simulated vehicle wandering the road network.
///
/// A vehicle is either travelling along a [Segment] or idle at a dead end.
/// It does not choose its own speed; the speed for each tick is computed by
/// the [FollowingModel](crate::FollowingModel) and passed to [Vehicle::advance].
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    id: VehicleId,
    /// The node the vehicle most recently visited.
    node: NodeId,
    /// The road the vehicle is travelling along, if any.
    segment: Option<Segment>,
    /// The world space coordinates of the vehicle.
    pos: Point2d,
    /// The heading of the current segment in radians.
    heading: f64,
    /// The speed most recently assigned by the following model, in units per tick.
    vel: f64,
    /// Factor multiplied with the target speed from the speed profile.
    vel_adj: f64,
}

impl Vehicle {
    /// Creates a new vehicle at the given node, with no segment chosen.
    pub(crate) fn new(id: VehicleId, start: NodeId, graph: &RoadGraph, grid: &Grid) -> Result<Self> {
        if start >= graph.num_nodes() {
            return Err(Error::InvalidStart {
                node: start,
                num_nodes: graph.num_nodes(),
            });
        }
        Ok(Self {
            id,
            node: start,
            segment: None,
            pos: grid.coord_of(start),
            heading: 0.0,
            vel: 0.0,
            vel_adj: 1.0,
        })
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The node the vehicle most recently visited.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The road the vehicle is currently travelling along.
    pub fn segment(&self) -> Option<Segment> {
        self.segment
    }

    /// The coordinates of the vehicle.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The vehicle's heading in radians.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// A unit vector aligned with the vehicle's heading.
    pub fn direction(&self) -> Vector2d {
        unit(self.heading)
    }

    /// The speed most recently assigned to the vehicle, in units per tick.
    /// Zero until the first tick.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The vehicle's velocity adjustment factor.
    pub fn velocity_adjust(&self) -> f64 {
        self.vel_adj
    }

    /// Whether the vehicle is stuck at a dead end.
    pub fn is_idle(&self) -> bool {
        self.segment.is_none()
    }

    /// The distance from the start of the current segment to the vehicle.
    pub fn distance_from_start(&self, grid: &Grid) -> Option<f64> {
        self.segment
            .map(|seg| grid.coord_of(seg.from).distance(self.pos))
    }

    /// The fraction of the current segment travelled so far.
    /// Not clamped, so floating point drift may push it slightly past 1.
    pub fn travelled(&self, grid: &Grid) -> Option<f64> {
        let seg = self.segment?;
        let length = grid.coord_of(seg.from).distance(grid.coord_of(seg.to));
        Some(self.distance_from_start(grid)? / length)
    }

    /// Set the velocity adjustment factor, which scales the vehicle's
    /// target speed before it is limited by the vehicles ahead.
    pub fn set_velocity_adjust(&mut self, factor: f64) {
        self.vel_adj = factor;
    }

    /// Records the speed the following model assigned for this tick.
    pub(crate) fn set_vel(&mut self, vel: f64) {
        self.vel = vel;
    }

    /// Moves the vehicle to an arbitrary point. Only used to set up test scenarios.
    #[cfg(test)]
    pub(crate) fn set_position(&mut self, pos: Point2d) {
        self.pos = pos;
    }

    /// Places the vehicle at the start of the given segment.
    /// The caller must have checked that the segment exists.
    pub(crate) fn set_segment(&mut self, segment: Segment, grid: &Grid) {
        self.node = segment.from;
        self.pos = grid.coord_of(segment.from);
        self.enter(segment, grid);
    }

    /// Picks one of the roads leaving the current node uniformly at random.
    /// Leaves the vehicle idle if the node is a dead end.
    pub fn choose_random_segment<R: Rng + ?Sized>(
        &mut self,
        graph: &RoadGraph,
        grid: &Grid,
        rng: &mut R,
    ) -> Result<Option<Segment>> {
        let frontier = graph.reachable_from(self.node)?;
        match frontier.choose(rng) {
            Some(&to) => {
                let segment = Segment::new(self.node, to);
                debug!("vehicle {:?} entering {} -> {}", self.id, segment.from, segment.to);
                self.enter(segment, grid);
            }
            None => {
                warn!("vehicle {:?} reached dead end at node {}", self.id, self.node);
                self.segment = None;
            }
        }
        Ok(self.segment)
    }

    /// Moves the vehicle `speed` units towards the end of its segment.
    ///
    /// Within `snap_threshold` of the end, or when `speed` would carry it past
    /// the end, the vehicle is placed exactly on the end node. On the following
    /// call it adopts that node and picks a new segment. Idle vehicles do not move.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        speed: f64,
        snap_threshold: f64,
        graph: &RoadGraph,
        grid: &Grid,
        rng: &mut R,
    ) -> Result<()> {
        let segment = match self.segment {
            Some(segment) => segment,
            None => return Ok(()),
        };

        let target = grid.coord_of(segment.to);
        let remaining = self.pos.distance(target);
        if remaining == 0.0 {
            debug!("vehicle {:?} arrived at node {}", self.id, segment.to);
            self.node = segment.to;
            self.choose_random_segment(graph, grid, rng)?;
            self.pos = grid.coord_of(self.node);
        } else if remaining < snap_threshold || speed >= remaining {
            self.pos = target;
        } else {
            self.pos += speed * self.direction();
        }
        Ok(())
    }

    /// Starts travelling along `segment` from wherever the vehicle currently is.
    fn enter(&mut self, segment: Segment, grid: &Grid) {
        self.segment = Some(segment);
        self.heading = heading(grid.coord_of(segment.from), grid.coord_of(segment.to));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use slotmap::KeyData;

    fn small_city() -> (RoadGraph, Grid) {
        let graph = RoadGraph::from_edges(4, &[(0, 1), (1, 0), (0, 2)]).unwrap();
        (graph, Grid::new(4, [200.0, 200.0].into(), 100.0))
    }

    fn vehicle_id() -> VehicleId {
        KeyData::from_ffi(1).into()
    }

    #[test]
    fn invalid_start() {
        let (graph, grid) = small_city();
        let err = Vehicle::new(vehicle_id(), 4, &graph, &grid).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidStart {
                node: 4,
                num_nodes: 4
            }
        );
    }

    #[test]
    fn chooses_only_reachable_segments() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
            let seg = veh.choose_random_segment(&graph, &grid, &mut rng).unwrap();
            assert!(matches!(seg, Some(Segment { from: 0, to: 1 | 2 })));
        }
    }

    #[test]
    fn dead_end_never_moves() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 3, &graph, &grid).unwrap();
        assert_eq!(veh.choose_random_segment(&graph, &grid, &mut rng), Ok(None));
        for _ in 0..10 {
            veh.advance(5.0, 5.0, &graph, &grid, &mut rng).unwrap();
            assert_eq!(veh.position(), grid.coord_of(3));
            assert!(veh.is_idle());
        }
    }

    #[test]
    fn moves_along_heading() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
        veh.set_segment(Segment::new(0, 1), &grid);
        veh.advance(5.0, 5.0, &graph, &grid, &mut rng).unwrap();
        assert_approx_eq!(veh.position().x, 200.0);
        assert_approx_eq!(veh.position().y, 205.0);
        assert_approx_eq!(veh.travelled(&grid).unwrap(), 0.05);
    }

    #[test]
    fn snaps_to_end_regardless_of_speed() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
        veh.set_segment(Segment::new(0, 1), &grid);
        veh.set_position(Point2d::new(200.0, 297.0));
        veh.advance(50.0, 5.0, &graph, &grid, &mut rng).unwrap();
        assert_eq!(veh.position(), grid.coord_of(1));
        assert_eq!(veh.node(), 0);
    }

    #[test]
    fn never_overshoots_the_end() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
        veh.set_segment(Segment::new(0, 1), &grid);
        veh.set_position(Point2d::new(200.0, 230.0));
        veh.advance(150.0, 5.0, &graph, &grid, &mut rng).unwrap();
        assert_eq!(veh.position(), grid.coord_of(1));
        assert_eq!(veh.segment(), Some(Segment::new(0, 1)));
    }

    #[test]
    fn arrival_picks_next_segment() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
        veh.set_segment(Segment::new(0, 1), &grid);
        veh.set_position(grid.coord_of(1));
        veh.advance(5.0, 5.0, &graph, &grid, &mut rng).unwrap();
        assert_eq!(veh.node(), 1);
        assert_eq!(veh.segment(), Some(Segment::new(1, 0)));
        assert_eq!(veh.position(), grid.coord_of(1));
    }

    #[test]
    fn arrival_at_dead_end_goes_idle() {
        let (graph, grid) = small_city();
        let mut rng = StdRng::seed_from_u64(0);
        let mut veh = Vehicle::new(vehicle_id(), 0, &graph, &grid).unwrap();
        veh.set_segment(Segment::new(0, 2), &grid);
        veh.set_position(grid.coord_of(2));
        veh.advance(5.0, 5.0, &graph, &grid, &mut rng).unwrap();
        assert_eq!(veh.node(), 2);
        assert!(veh.is_idle());
        assert_eq!(veh.position(), grid.coord_of(2));
    }
}
