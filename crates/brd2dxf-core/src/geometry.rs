//! 2D geometry primitives for stroke and pad reconstruction.
//!
//! Board primitives carry abstract dimensions (a wire has a width, a pad has
//! a drill and a diameter). Everything here turns those into concrete point
//! rings: N-gon circle approximations and capsule bodies for stroked
//! segments. All angles are radians, counter-clockwise positive.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Number of vertices used to approximate a full circle.
pub const CIRCLE_STEPS: usize = 18;

/// Number of vertices used for octagonal pads.
pub const OCTAGON_STEPS: usize = 8;

/// A point in board units (millimeters for EAGLE boards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An ordered point ring describing a closed planar region.
///
/// Rings produced by [`approximate_circle`] repeat the first point at the
/// end; consumers must not assume a strictly minimal closed ring.
pub type Ring = Vec<Point>;

/// Signed angle of the directed segment from `p1` to `p2`.
pub fn angle_of_line(p1: Point, p2: Point) -> f64 {
    (p2.y - p1.y).atan2(p2.x - p1.x)
}

/// Rotates `point` around `origin` by `angle` radians (CCW positive).
pub fn rotate_point(origin: Point, point: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(
        origin.x + cos * (point.x - origin.x) - sin * (point.y - origin.y),
        origin.y + sin * (point.x - origin.x) + cos * (point.y - origin.y),
    )
}

/// Regular N-gon approximating a circle.
///
/// Returns `steps + 1` points starting at angle `-step/2`; the last point
/// coincides with the first.
pub fn approximate_circle(center: Point, radius: f64, steps: usize) -> Ring {
    let step = 2.0 * PI / steps as f64;
    let mut points = Vec::with_capacity(steps + 1);
    for k in 0..=steps {
        let angle = -step / 2.0 + k as f64 * step;
        points.push(Point::new(
            center.x + radius * angle.sin(),
            center.y - radius * angle.cos(),
        ));
    }
    points
}

/// Capsule body quadrilateral for a stroked segment.
///
/// The four corners are the perpendicular offsets of `width / 2` at each
/// endpoint. Round end caps are separate circle rings added by callers.
pub fn stroke_outline(p1: Point, p2: Point, width: f64) -> [Point; 4] {
    let radius = width / 2.0;
    let line_angle = angle_of_line(p1, p2);
    let offset = |p: Point, angle: f64| {
        Point::new(p.x + radius * angle.sin(), p.y - radius * angle.cos())
    };
    let in_from = offset(p1, line_angle + PI);
    let in_to = offset(p2, line_angle + PI);
    let out_to = offset(p2, line_angle);
    let out_from = offset(p1, line_angle);
    [in_from, in_to, out_to, out_from]
}
