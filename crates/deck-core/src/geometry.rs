//! Geometry primitives shared across deckhand crates.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A position or offset in deck coordinates, in millimeters.
///
/// The deck origin sits at the front-left corner at deck level: x grows to
/// the right, y grows toward the back of the robot, z grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const ZERO: Point = Point {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same x/y with a different z.
    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_add_and_sub() {
        let a = Point::new(1.0, 2.0, 3.0);
        let b = Point::new(10.0, 20.0, 30.0);

        assert_eq!(a + b, Point::new(11.0, 22.0, 33.0));
        assert_eq!(b - a, Point::new(9.0, 18.0, 27.0));
    }

    #[test]
    fn point_with_z_keeps_xy() {
        let p = Point::new(5.0, 6.0, 7.0).with_z(42.0);
        assert_eq!(p, Point::new(5.0, 6.0, 42.0));
    }

    #[test]
    fn zero_is_additive_identity() {
        let p = Point::new(3.5, -1.0, 9.25);
        assert_eq!(p + Point::ZERO, p);
    }
}
