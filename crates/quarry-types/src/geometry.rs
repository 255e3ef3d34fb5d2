//! Planar geometry for unit and structure positions.
//!
//! The engine reports positions as 2D map coordinates. [`Point2`] carries the
//! handful of operations the controller needs; arithmetic is exposed as named
//! methods rather than operator overloads so call sites stay explicit.

use serde::{Deserialize, Serialize};

/// A point on the 2D game map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Map x coordinate.
    pub x: f32,
    /// Map y coordinate.
    pub y: f32,
}

impl Point2 {
    /// Create a point from map coordinates.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`. Cheaper than [`Self::distance_to`]
    /// and sufficient for comparisons.
    pub const fn distance_squared_to(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f32 {
        self.distance_squared_to(other).sqrt()
    }

    /// The point shifted by `(dx, dy)`.
    pub const fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The point reached by moving `distance` units from here toward `target`.
    ///
    /// When `target` coincides with this point there is no direction to move
    /// in, and the point is returned unchanged.
    pub fn towards(self, target: Self, distance: f32) -> Self {
        let len = self.distance_to(target);
        if len <= f32::EPSILON {
            return self;
        }
        let scale = distance / len;
        Self {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn distance_is_euclidean() {
        let origin = Point2::new(0.0, 0.0);
        let p = Point2::new(3.0, 4.0);
        assert!(close(origin.distance_to(p), 5.0));
        assert!(close(origin.distance_squared_to(p), 25.0));
    }

    #[test]
    fn offset_shifts_both_axes() {
        let p = Point2::new(1.0, 2.0).offset(-0.25, 0.5);
        assert!(close(p.x, 0.75));
        assert!(close(p.y, 2.5));
    }

    #[test]
    fn towards_moves_along_the_segment() {
        let from = Point2::new(0.0, 0.0);
        let to = Point2::new(10.0, 0.0);
        let p = from.towards(to, 0.6);
        assert!(close(p.x, 0.6));
        assert!(close(p.y, 0.0));
    }

    #[test]
    fn towards_can_overshoot_the_target() {
        let from = Point2::new(0.0, 0.0);
        let to = Point2::new(1.0, 0.0);
        let p = from.towards(to, 3.0);
        assert!(close(p.x, 3.0));
    }

    #[test]
    fn towards_degenerate_segment_stays_put() {
        let p = Point2::new(2.0, 2.0);
        let moved = p.towards(p, 0.6);
        assert!(close(moved.x, 2.0));
        assert!(close(moved.y, 2.0));
    }
}
