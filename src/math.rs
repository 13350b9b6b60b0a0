//! Mathematical types and functions.

use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Computes the heading in radians of the straight line from `from` to `to`.
///
/// Vertical lines need no special treatment, `atan2` yields ±π/2 for them.
pub fn heading(from: Point2d, to: Point2d) -> f64 {
    let delta = to - from;
    f64::atan2(delta.y, delta.x)
}

/// A unit vector pointing along the given heading.
pub fn unit(heading: f64) -> Vector2d {
    Vector2d::new(heading.cos(), heading.sin())
}
